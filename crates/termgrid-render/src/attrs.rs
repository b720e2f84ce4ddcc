#![forbid(unsafe_code)]

//! Text attribute bit-set stored per cell.

bitflags::bitflags! {
    /// 8-bit text attribute flags.
    ///
    /// Bit positions match the wire packing used by engine adapters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextAttributes: u8 {
        /// Bold / increased intensity.
        const BOLD          = 0b0000_0001;
        /// Dim / decreased intensity.
        const DIM           = 0b0000_0010;
        /// Italic text.
        const ITALIC        = 0b0000_0100;
        /// Single underline.
        const UNDERLINE     = 0b0000_1000;
        /// Blinking text.
        const BLINK         = 0b0001_0000;
        /// Swap foreground and background.
        const INVERSE       = 0b0010_0000;
        /// Strikethrough.
        const STRIKETHROUGH = 0b0100_0000;
        /// Hidden / invisible text.
        const HIDDEN        = 0b1000_0000;
    }
}

impl TextAttributes {
    /// Attributes from a raw byte, keeping every bit.
    #[inline]
    pub const fn from_raw(bits: u8) -> Self {
        Self::from_bits_retain(bits)
    }
}
