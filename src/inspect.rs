//! Textual inspection of lowered programs.
//!
//! Lowered StableHLO text is line-oriented MLIR; callers typically sanity
//! check an export by counting occurrences of an operator mnemonic, e.g.
//! one `stablehlo.add` for an elementwise-add module.

/// Count whole-token occurrences of `op` in `program`.
///
/// A match is rejected when it abuts another token character on either
/// side, so `op_count(text, "stablehlo.add")` does not count
/// `stablehlo.add_n` or `xstablehlo.add`.
pub fn op_count(program: &str, op: &str) -> usize {
    if op.is_empty() {
        return 0;
    }
    let bytes = program.as_bytes();
    program
        .match_indices(op)
        .filter(|(at, _)| {
            let before_ok = *at == 0 || !is_token_byte(bytes[at - 1]);
            let end = at + op.len();
            let after_ok = end == bytes.len() || !is_token_byte(bytes[end]);
            before_ok && after_ok
        })
        .count()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

#[cfg(test)]
mod tests {
    use super::op_count;

    const ADD_MODULE: &str = r#"module @forward {
  func.func @main(%arg0: tensor<1x3xf32>, %arg1: tensor<1x3xf32>) -> tensor<1x3xf32> {
    %0 = stablehlo.add %arg0, %arg1 : tensor<1x3xf32>
    return %0 : tensor<1x3xf32>
  }
}"#;

    #[test]
    fn counts_single_add() {
        assert_eq!(op_count(ADD_MODULE, "stablehlo.add"), 1);
        assert_eq!(op_count(ADD_MODULE, "stablehlo.convolution"), 0);
    }

    #[test]
    fn whole_token_only() {
        let text = "stablehlo.add stablehlo.add_n xstablehlo.add";
        assert_eq!(op_count(text, "stablehlo.add"), 1);
    }

    #[test]
    fn counts_repeats() {
        let text = "%0 = stablehlo.add %a, %b\n%1 = stablehlo.add %0, %b\n";
        assert_eq!(op_count(text, "stablehlo.add"), 2);
    }

    #[test]
    fn empty_needle_counts_nothing() {
        assert_eq!(op_count(ADD_MODULE, ""), 0);
    }
}
