// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Part of the MIND project (Machine Intelligence Native Design).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Manifest format version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// How a function's program artifact is stored on disk.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgramKind {
    Text,
    Binary,
}

impl ProgramKind {
    /// File name of the program artifact inside the function's sub-path.
    pub fn file_name(self) -> &'static str {
        match self {
            ProgramKind::Text => "program.mlir",
            ProgramKind::Binary => "program.bin",
        }
    }
}

/// Per-function manifest entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FuncEntry {
    pub program: ProgramKind,
    pub program_sha256: String,
    pub weights_sha256: String,
}

/// `bundle.toml` at the root of a saved bundle directory: the format
/// version plus one entry per function, keyed (and therefore sorted) by
/// function name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BundleManifest {
    pub format_version: u32,
    pub functions: BTreeMap<String, FuncEntry>,
}

impl BundleManifest {
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
