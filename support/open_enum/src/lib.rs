// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![no_std]

//! Provides the [`open_enum`] macro.

/// Creates a newtype over an integer that behaves like an enum, without the
/// undefined behavior of matching a value outside of the enum.
///
/// Wire protocols (SCSI operation codes, sense keys, ATA commands) define a
/// code space where only some values have names. The generated type is a
/// `#[repr(transparent)]` struct with one `pub const` per named value, so any
/// value read from the wire is representable.
///
/// The macro implements `Copy`, `Clone`, `Debug`, `Eq`, `PartialEq`, `Hash`,
/// `Ord`, `PartialOrd`, and `From` conversions to and from the storage type.
/// `name()` returns the first declared name for a value, which is what
/// structured logging records; aliases sharing a value resolve to the earlier
/// name.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate open_enum; fn main() {
/// use open_enum::open_enum;
/// open_enum! {
///     pub enum SenseKey: u8 {
///         #![allow(missing_docs)]
///         NO_SENSE = 0x00,
///         NOT_READY = 0x02,
///         ILLEGAL_REQUEST = 0x05,
///     }
/// }
///
/// let key = SenseKey::from(0x05);
/// assert_eq!(key, SenseKey::ILLEGAL_REQUEST);
/// assert_eq!(key.name(), Some("ILLEGAL_REQUEST"));
/// assert_eq!(SenseKey(0x0e).name(), None);
/// assert_eq!(u8::from(SenseKey::NOT_READY), 2);
/// # }
/// ```
#[macro_export]
macro_rules! open_enum {
    (
        $(#[$a:meta])*
        $v:vis enum $name:ident : $storage:ty {
            $(#![$implattr:meta])*
            $(
                $(#[$vattr:meta])*
                $variant:ident = $value:expr,
            )*
        }
    ) => {
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        $(#[$a])*
        $v struct $name(pub $storage);
        $(#[$implattr])*
        impl $name {
            $(
                $(#[$vattr])*
                pub const $variant: $name = $name($value);
            )*
        }
        impl $name {
            /// Returns the declared name of this value, if it has one.
            #[allow(dead_code)]
            pub fn name(&self) -> Option<&'static str> {
                #![allow(unreachable_patterns)]
                match *self {
                    $( Self::$variant => Some(stringify!($variant)), )*
                    _ => None,
                }
            }
        }
        impl ::core::convert::From<$storage> for $name {
            fn from(value: $storage) -> Self {
                Self(value)
            }
        }
        impl ::core::convert::From<$name> for $storage {
            fn from(value: $name) -> Self {
                value.0
            }
        }
        impl ::core::fmt::Debug for $name {
            fn fmt(&self, fmt: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self.name() {
                    Some(s) => fmt.pad(s),
                    None => ::core::fmt::Debug::fmt(&self.0, fmt),
                }
            }
        }
    }
}
