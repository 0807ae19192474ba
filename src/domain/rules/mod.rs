// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod ccgp_portal;
pub mod ccgp_search;
pub mod ccgp_sichuan;
pub mod control;
pub mod default_rule;
pub mod dom;
pub mod json_fields;
pub mod layout;
pub mod registry;
pub mod traits;
pub mod waits;

pub use control::{NavigationMark, NavigationOutcome, PageControl};
pub use registry::RuleRegistry;
pub use traits::{ApiTrigger, ExtractionMode, SiteRule, UrlPattern};
