//! Canonical Huffman code reconstruction for DHT segments.

use core::fmt;

use crate::error::{Error, Result};

/// Number of significant bits of `v`: `floor(log2(v)) + 1` for nonzero `v`,
/// 0 for zero.
pub(crate) fn significant_bits(v: u32) -> u32 {
    u32::BITS - v.leading_zeros()
}

/// A symbol value together with its assigned canonical code.
#[derive(Clone, Copy)]
pub struct CodeEntry {
    code: u16,
    bits: u8,
    value: u8,
}

impl CodeEntry {
    /// The assigned code, stored in the least significant `bits` bits.
    #[inline]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Length of the code in bits (1-16).
    #[inline]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// The symbol value the code decodes to. For DC tables this is the SSSS
    /// magnitude category.
    #[inline]
    pub fn value(&self) -> u8 {
        self.value
    }
}

/// The explicit code table reconstructed from one DHT table definition.
pub struct CodeTable {
    entries: Vec<CodeEntry>,
}

impl CodeTable {
    /// Assigns canonical codes following the `Generate_size_table` and
    /// `Generate_code_table` procedures in Annex C of ITU-T T.81.
    ///
    /// `counts[i]` is the number of codes of length `i + 1` bits; `symbols`
    /// holds the code values in the order they appear in the segment. Fails
    /// if the counts disagree with the number of symbols, or if some length
    /// is assigned more codes than a prefix-free code can hold.
    pub fn build(counts: &[u8; 16], symbols: &[u8]) -> Result<Self> {
        let total: usize = counts.iter().map(|&c| usize::from(c)).sum();
        if total != symbols.len() {
            return Err(Error::malformed_huffman_table(format!(
                "counts declare {total} symbols but {} are present",
                symbols.len()
            )));
        }

        let mut entries = Vec::with_capacity(total);
        let mut next_code: u32 = 0;
        let mut symbol_iter = symbols.iter();
        for (i, &count) in counts.iter().enumerate() {
            let bits = (i + 1) as u8;

            next_code <<= 1;

            for _ in 0..count {
                if significant_bits(next_code) > u32::from(bits) {
                    return Err(Error::malformed_huffman_table(format!(
                        "too many codes of length {bits} bits or shorter"
                    )));
                }
                // Cannot run dry, the totals were checked above.
                let &value = symbol_iter.next().unwrap();
                entries.push(CodeEntry {
                    code: next_code as u16,
                    bits,
                    value,
                });
                next_code += 1;
            }
        }

        Ok(Self { entries })
    }

    /// Entries in assignment order: non-decreasing bit length, ascending
    /// code value within a length.
    pub fn entries(&self) -> impl Iterator<Item = &CodeEntry> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "{} {:02$b} -> {3:02x}",
                entry.bits,
                entry.code,
                usize::from(entry.bits),
                entry.value,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn significant_bit_counts() {
        assert_eq!(significant_bits(0), 0);
        assert_eq!(significant_bits(1), 1);
        assert_eq!(significant_bits(2), 2);
        assert_eq!(significant_bits(3), 2);
        assert_eq!(significant_bits(4), 3);
        assert_eq!(significant_bits(255), 8);
        assert_eq!(significant_bits(256), 9);
        assert_eq!(significant_bits(u32::MAX), 32);

        // floor(log2(v)) + 1 for every nonzero v.
        for v in 1..=4096u32 {
            let s = significant_bits(v);
            assert!(1 << (s - 1) <= v, "{v}");
            assert!(u64::from(v) < 1 << s, "{v}");
        }
    }

    #[test]
    fn tablegen() {
        // Default Luminance DC table.
        let num_dc_codes = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        let dc_values = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
        ];

        let tbl = CodeTable::build(&num_dc_codes, &dc_values).unwrap();
        assert_eq!(tbl.len(), dc_values.len());
        expect_test::expect![[r#"
            2 00 -> 00
            3 010 -> 01
            3 011 -> 02
            3 100 -> 03
            3 101 -> 04
            3 110 -> 05
            4 1110 -> 06
            5 11110 -> 07
            6 111110 -> 08
            7 1111110 -> 09
            8 11111110 -> 0a
            9 111111110 -> 0b

        "#]]
        .assert_debug_eq(&tbl);
    }

    #[test]
    fn two_codes_of_one_length() {
        let mut counts = [0; 16];
        counts[2] = 2; // two codes of 3 bits
        let tbl = CodeTable::build(&counts, &[0x00, 0x01]).unwrap();
        expect_test::expect![[r#"
            3 000 -> 00
            3 001 -> 01

        "#]]
        .assert_debug_eq(&tbl);
    }

    #[test]
    fn codes_are_prefix_free() {
        let counts = [0, 2, 3, 0, 3, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0];
        let symbols: Vec<u8> = (0..9).collect();
        let tbl = CodeTable::build(&counts, &symbols).unwrap();

        let entries: Vec<_> = tbl.entries().copied().collect();
        assert_eq!(entries.len(), 9);
        for (i, a) in entries.iter().enumerate() {
            for (j, b) in entries.iter().enumerate() {
                if i == j || a.bits() > b.bits() {
                    continue;
                }
                assert_ne!(
                    b.code() >> (b.bits() - a.bits()),
                    a.code(),
                    "{:b} is a prefix of {:b}",
                    a.code(),
                    b.code(),
                );
            }
        }
    }

    #[test]
    fn count_symbol_mismatch_is_rejected() {
        let mut counts = [0; 16];
        counts[0] = 1;
        counts[1] = 2;
        let err = CodeTable::build(&counts, &[0x00, 0x01]).unwrap_err();
        assert!(err.is_malformed_huffman_table());
    }

    #[test]
    fn oversubscribed_length_is_rejected() {
        let mut counts = [0; 16];
        counts[0] = 3; // only two 1-bit codes can exist
        let err = CodeTable::build(&counts, &[0x00, 0x01, 0x02]).unwrap_err();
        assert!(err.is_malformed_huffman_table());
    }
}
