use log::trace;

use mm_word::Word;

use crate::error::MemError;

/// Cell-addressable memory.
///
/// Every model machine declares a cell size in bytes (1, 2, 3, 5 or 7); an
/// *address* is a cell index, wrapping modulo `2^address_bits` (16 for every real
/// machine, kept generic here for cheap unit tests). A fetch or store of `bits`
/// touches `bits / (cell_bytes * 8)` consecutive cells starting at that address,
/// most significant byte first. Cells remember whether they were ever written so
/// that `protected` machines can reject reads of memory the loader never touched.
pub struct Ram {
    bytes: Vec<u8>,
    written: Vec<bool>,
    cell_bytes: u32,
    address_bits: u32,
    protected: bool,
}

impl Ram {
    pub fn new(cell_bytes: u32, address_bits: u32, protected: bool) -> Self {
        let cell_count = 1usize << address_bits;
        let byte_count = cell_count * cell_bytes as usize;
        Self {
            bytes: vec![0; byte_count],
            written: vec![false; byte_count],
            cell_bytes,
            address_bits,
            protected,
        }
    }

    fn wrap(&self, address: u32) -> u32 {
        address & ((1u32 << self.address_bits) - 1)
    }

    fn cells_for(&self, bits: u32) -> Result<usize, MemError> {
        let cell_bits = self.cell_bytes * 8;
        if bits == 0 || bits % cell_bits != 0 {
            return Err(MemError::width_mismatch(cell_bits, bits));
        }
        Ok((bits / cell_bits) as usize)
    }

    /// Write raw bytes into memory starting at byte offset `address`, marking
    /// every touched byte initialised. Used by the loader to place program
    /// images as a flat byte stream; bypasses the protected-read check (which
    /// only governs reads).
    pub fn load_span(&mut self, address: u16, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            let idx = (address as usize + i) % self.bytes.len();
            self.bytes[idx] = byte;
            self.written[idx] = true;
        }
    }

    /// Raw byte-level fetch, bypassing the cell/protected machinery. The
    /// control unit uses this to read the instruction stream: an opcode and
    /// its operands are always a byte sequence, whatever the machine's cell
    /// size happens to be for data words.
    pub fn fetch_byte(&self, byte_offset: u32) -> u8 {
        let idx = byte_offset as usize % self.bytes.len();
        self.bytes[idx]
    }

    pub fn fetch(&self, address: u16, bits: u32) -> Result<Word, MemError> {
        let n = self.cells_for(bits)?;
        let mut raw: u64 = 0;
        for i in 0..n {
            let cell = self.wrap(address as u32 + i as u32) as usize;
            for b in 0..self.cell_bytes as usize {
                let idx = cell * self.cell_bytes as usize + b;
                if self.protected && !self.written[idx] {
                    trace!("uninitialised read at cell {cell:#06x}");
                    return Err(MemError::UninitialisedRead(cell as u16));
                }
                raw = (raw << 8) | self.bytes[idx] as u64;
            }
        }
        Ok(Word::from_unsigned(bits, raw))
    }

    pub fn store(&mut self, address: u16, word: Word) -> Result<(), MemError> {
        let n = self.cells_for(word.width())?;
        let value_bytes = word.to_bytes_be();
        for i in 0..n {
            let cell = self.wrap(address as u32 + i as u32) as usize;
            for b in 0..self.cell_bytes as usize {
                let idx = cell * self.cell_bytes as usize + b;
                self.bytes[idx] = value_bytes[i * self.cell_bytes as usize + b];
                self.written[idx] = true;
            }
        }
        Ok(())
    }

    pub fn cell_bytes(&self) -> u32 {
        self.cell_bytes
    }

    pub fn address_bits(&self) -> u32 {
        self.address_bits
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fetch_store_round_trips_at_every_aligned_address() {
        let mut ram = Ram::new(1, 16, false);
        for addr in (0u32..256).step_by(2) {
            let word = Word::from_unsigned(16, addr as u64 ^ 0xabcd);
            ram.store(addr as u16, word).unwrap();
            assert_eq!(ram.fetch(addr as u16, 16).unwrap(), word);
        }
    }

    #[test]
    fn round_trips_with_wide_cells() {
        let mut ram = Ram::new(3, 16, false);
        let word = Word::from_unsigned(24, 0x01_ab_cd);
        ram.store(5, word).unwrap();
        assert_eq!(ram.fetch(5, 24).unwrap(), word);
    }

    #[test]
    fn uninitialised_read_fails_when_protected() {
        let ram = Ram::new(1, 16, true);
        assert!(matches!(ram.fetch(0, 8), Err(MemError::UninitialisedRead(0))));
    }

    #[test]
    fn uninitialised_read_is_zero_when_permissive() {
        let ram = Ram::new(1, 16, false);
        assert_eq!(ram.fetch(0, 8).unwrap(), Word::zero(8));
    }

    #[test]
    fn addresses_wrap_modulo_address_space() {
        let mut ram = Ram::new(1, 16, false);
        let word = Word::from_unsigned(8, 42);
        ram.store(0xffff, word).unwrap();
        assert_eq!(ram.fetch(0xffff, 8).unwrap(), word);
    }
}
