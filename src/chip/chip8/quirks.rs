/// Selects between the divergent behaviours historical interpreters show for
/// a handful of instructions. The default is the modern convention most
/// programs are tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY6 and 8XYE shift VY into VX instead of shifting VX in place.
    pub shift_reads_vy: bool,

    /// 8XY1, 8XY2 and 8XY3 reset VF to 0.
    pub logic_resets_flag: bool,

    /// FX55 and FX65 leave I pointing past the last register transferred.
    pub load_store_increments_index: bool,

    /// EX9E and EXA1 only look at the low nibble of VX. When unset, a VX
    /// above 0xF is a fault.
    pub mask_key_index: bool,
}

impl Quirks {
    pub const fn modern() -> Self {
        Quirks {
            shift_reads_vy: false,
            logic_resets_flag: true,
            load_store_increments_index: false,
            mask_key_index: false,
        }
    }

    /// The behaviour of the CHIP-8 interpreter shipped with the COSMAC VIP.
    pub const fn cosmac_vip() -> Self {
        Quirks {
            shift_reads_vy: true,
            logic_resets_flag: true,
            load_store_increments_index: true,
            mask_key_index: false,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks::modern()
    }
}
