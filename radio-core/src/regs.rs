//! AT86RF230-class transceiver register map and bus command opcodes

/// Bus command opcodes; register commands carry a 6-bit address in the low
/// bits, frame and SRAM commands stand alone.
pub mod cmd {
    pub const REGISTER_READ: u8 = 0x80;
    pub const REGISTER_WRITE: u8 = 0xC0;
    pub const FRAME_READ: u8 = 0x20;
    pub const FRAME_WRITE: u8 = 0x60;
    pub const SRAM_READ: u8 = 0x00;
    pub const SRAM_WRITE: u8 = 0x40;

    /// Mask for the 6-bit register address OR'd into register commands
    pub const ADDRESS_MASK: u8 = 0x3F;
}

/// Register addresses
pub const TRX_STATUS: u8 = 0x01;
pub const TRX_STATE: u8 = 0x02;
pub const TRX_CTRL_0: u8 = 0x03;
pub const PHY_TX_PWR: u8 = 0x05;
pub const PHY_RSSI: u8 = 0x06;
pub const PHY_ED_LEVEL: u8 = 0x07;
pub const PHY_CC_CCA: u8 = 0x08;
pub const CCA_THRES: u8 = 0x09;
pub const IRQ_MASK: u8 = 0x0E;
pub const IRQ_STATUS: u8 = 0x0F;
pub const VREG_CTRL: u8 = 0x10;
pub const BATMON: u8 = 0x11;
pub const XOSC_CTRL: u8 = 0x12;
pub const PLL_CF: u8 = 0x1A;
pub const PLL_DCU: u8 = 0x1B;
pub const PART_NUM: u8 = 0x1C;
pub const VERSION_NUM: u8 = 0x1D;
pub const MAN_ID_0: u8 = 0x1E;
pub const MAN_ID_1: u8 = 0x1F;
pub const SHORT_ADDR_0: u8 = 0x20;
pub const SHORT_ADDR_1: u8 = 0x21;
pub const PAN_ID_0: u8 = 0x22;
pub const PAN_ID_1: u8 = 0x23;
pub const IEEE_ADDR_0: u8 = 0x24;

/// Interrupt status / mask bits
pub mod irq {
    pub const BAT_LOW: u8 = 0x80;
    pub const TRX_UR: u8 = 0x40;
    pub const TRX_END: u8 = 0x08;
    pub const RX_START: u8 = 0x04;
    pub const PLL_UNLOCK: u8 = 0x02;
    pub const PLL_LOCK: u8 = 0x01;
}

/// TRX_STATE commands
pub mod state_cmd {
    pub const NOP: u8 = 0x00;
    pub const TX_START: u8 = 0x02;
    pub const FORCE_TRX_OFF: u8 = 0x03;
    pub const RX_ON: u8 = 0x06;
    pub const TRX_OFF: u8 = 0x08;
    pub const PLL_ON: u8 = 0x09;
}

/// TRX_STATUS values (low five bits of the status register)
pub mod status {
    pub const P_ON: u8 = 0x00;
    pub const BUSY_RX: u8 = 0x01;
    pub const BUSY_TX: u8 = 0x02;
    pub const RX_ON: u8 = 0x06;
    pub const TRX_OFF: u8 = 0x08;
    pub const PLL_ON: u8 = 0x09;
    pub const SLEEP: u8 = 0x0F;
}

/// Subregister (mask, shift) pairs within the registers above
pub mod sub {
    /// TRX_STATUS.trx_status
    pub const TRX_STATUS: (u8, u8) = (0x1F, 0);
    /// TRX_STATUS.cca_done
    pub const CCA_DONE: (u8, u8) = (0x80, 7);
    /// TRX_STATE.trx_cmd
    pub const TRX_CMD: (u8, u8) = (0x1F, 0);
    /// PHY_CC_CCA.channel
    pub const CHANNEL: (u8, u8) = (0x1F, 0);
    /// PHY_CC_CCA.cca_request
    pub const CCA_REQUEST: (u8, u8) = (0x80, 7);
    /// PHY_TX_PWR.tx_pwr
    pub const TX_PWR: (u8, u8) = (0x0F, 0);
    /// PHY_RSSI.rssi
    pub const RSSI: (u8, u8) = (0x1F, 0);
    /// BATMON.batmon_vth
    pub const BATMON_VTH: (u8, u8) = (0x0F, 0);
}

/// Largest PSDU a frame buffer transaction can carry, in bytes
pub const MAX_FRAME_SIZE: usize = 127;

/// Expected PART_NUM value for this transceiver family
pub const SUPPORTED_PART_NUM: u8 = 0x02;
