// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod crawl_controller_test;
pub mod crawl_use_case_test;
pub mod helpers;
pub mod tender_repository_test;
