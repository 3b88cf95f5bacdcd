// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod mode_select_tests;
mod translate_tests;
