// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod envelope;
pub mod http_page;
pub mod interceptor;
pub mod network;
pub mod traits;
