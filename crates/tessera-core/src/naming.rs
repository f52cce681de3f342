// Copyright 2025 eraflo
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

//! Name helpers shared by the tree and the import pipeline.

use std::collections::HashSet;

/// Returns `desired` if no sibling uses it, otherwise `"desired N"` for the
/// smallest `N >= 1` that is free.
pub fn unique_name<'a>(desired: &str, siblings: impl IntoIterator<Item = &'a str>) -> String {
    let taken: HashSet<&str> = siblings.into_iter().collect();
    if !taken.contains(desired) {
        return desired.to_string();
    }
    (1..)
        .map(|n| format!("{desired} {n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| desired.to_string())
}

/// Strips the extension (from the last `.`) of a file name.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_free() {
        assert_eq!(unique_name("Crate", ["Barrel"]), "Crate");
    }

    #[test]
    fn test_unique_name_fills_smallest_gap() {
        assert_eq!(unique_name("Crate", ["Crate", "Crate 2"]), "Crate 1");
        assert_eq!(unique_name("Crate", ["Crate", "Crate 1", "Crate 2"]), "Crate 3");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("crate.prefab"), "crate");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("plain"), "plain");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }
}
