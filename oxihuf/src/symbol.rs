//! Per-symbol code table derived from a Huffman tree.

use crate::histogram::ASCII_COUNT;
use crate::tree::Tree;

/// Bit path from the root to a leaf; `false` is a left step, `true` a right step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolCode {
    bits: Vec<bool>,
}

impl SymbolCode {
    /// Code bits in transmission order.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Code length in bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` for a zero-length code.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

impl std::fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Code of every symbol present in a tree.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    codes: Vec<Option<SymbolCode>>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            codes: vec![None; ASCII_COUNT],
        }
    }

    /// Derive codes from `tree`, replacing the current contents.
    ///
    /// Each leaf is walked up to the root, recording which side it hangs from,
    /// and the path is reversed. A tree whose root is itself a leaf gives that
    /// symbol the one-bit code `0`, so every present symbol costs at least one bit.
    pub fn build(&mut self, tree: &Tree) {
        self.reset();

        let Some(root) = tree.root() else {
            return;
        };

        for symbol in 0..ASCII_COUNT {
            let Some(leaf) = tree.leaf(symbol as u8) else {
                continue;
            };

            let code = self.codes[symbol].get_or_insert_with(SymbolCode::default);
            if leaf == root {
                code.bits.push(false);
                continue;
            }

            let mut id = leaf;
            while let Some(parent) = tree.node(id).parent() {
                code.bits.push(tree.node(parent).right() == Some(id));
                id = parent;
            }
            code.bits.reverse();
        }
    }

    /// Code for `symbol`, or `None` if it does not occur.
    pub fn get(&self, symbol: u8) -> Option<&SymbolCode> {
        self.codes[symbol as usize].as_ref()
    }

    /// Forget every code.
    pub fn reset(&mut self) {
        self.codes.fill(None);
    }

    /// Number of symbols with a code.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|code| code.is_some()).count()
    }

    /// Returns `true` if no symbol has a code.
    pub fn is_empty(&self) -> bool {
        self.codes.iter().all(Option::is_none)
    }

    /// Length of the longest code, zero for an empty table.
    pub fn max_code_len(&self) -> usize {
        self.codes.iter().flatten().map(SymbolCode::len).max().unwrap_or(0)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
