//! Compiler version hint extraction.

use regex::Regex;
use std::sync::LazyLock;

static PRAGMA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pragma solidity\s*[<>^]?=?\s*(\d[\d.]*)").expect("pragma pattern is valid")
});

/// Extracts the version from the first `pragma solidity` declaration.
///
/// Only the first declaration counts, so `pragma solidity >=0.6.0 <0.9.0;`
/// yields `"0.6.0"`.
pub fn extract_compiler_version(source: &str) -> Option<String> {
    PRAGMA
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_compiles_with_one_capture() {
        // Whole match plus the version group
        assert_eq!(PRAGMA.captures_len(), 2);
    }

    #[test]
    fn test_caret_version() {
        let source = "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.10;\n\ncontract A {}";
        assert_eq!(extract_compiler_version(source).as_deref(), Some("0.8.10"));
    }

    #[test]
    fn test_exact_version() {
        assert_eq!(
            extract_compiler_version("pragma solidity 0.4.24;").as_deref(),
            Some("0.4.24")
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            extract_compiler_version("pragma solidity >=0.6.0 <0.9.0;").as_deref(),
            Some("0.6.0")
        );
        assert_eq!(
            extract_compiler_version("pragma solidity <= 0.5.17;").as_deref(),
            Some("0.5.17")
        );
        assert_eq!(
            extract_compiler_version("pragma solidity>0.7.0;").as_deref(),
            Some("0.7.0")
        );
    }

    #[test]
    fn test_first_match_wins() {
        let source = "pragma solidity ^0.5.0;\nimport './B.sol';\npragma solidity ^0.8.0;";
        assert_eq!(extract_compiler_version(source).as_deref(), Some("0.5.0"));
    }

    #[test]
    fn test_absent() {
        assert_eq!(extract_compiler_version("contract A {}"), None);
        assert_eq!(extract_compiler_version(""), None);
        assert_eq!(extract_compiler_version("pragma experimental ABIEncoderV2;"), None);
    }
}
