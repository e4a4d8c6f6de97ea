// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lexical analysis utilities

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Reserved words recognised by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    True,
    False,
    Asc,
    Desc,
}

impl Keyword {
    /// Sort keywords match in any letter case, literals only in lower case
    fn case_insensitive(self) -> bool {
        matches!(self, Keyword::Asc | Keyword::Desc)
    }
}

static KEYWORD_TABLE: Lazy<FxHashMap<&'static str, Keyword>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("true", Keyword::True);
    map.insert("false", Keyword::False);
    map.insert("asc", Keyword::Asc);
    map.insert("desc", Keyword::Desc);
    map
});

/// Look an identifier up in the keyword table
pub fn keyword(ident: &str) -> Option<Keyword> {
    if let Some(keyword) = KEYWORD_TABLE.get(ident) {
        return Some(*keyword);
    }
    if ident.len() > 4 || !ident.is_ascii() {
        return None;
    }
    KEYWORD_TABLE
        .get(ident.to_ascii_lowercase().as_str())
        .copied()
        .filter(|keyword| keyword.case_insensitive())
}

/// Check if a character can start an identifier
pub fn is_identifier_start(c: char) -> bool {
    unicode_xid::UnicodeXID::is_xid_start(c) || c == '_'
}

/// Check if a character can continue an identifier
pub fn is_identifier_continue(c: char) -> bool {
    unicode_xid::UnicodeXID::is_xid_continue(c)
}
