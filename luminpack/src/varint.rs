//! Variable width integers. Values between [`MIN_SINGLE_VALUE`] and [`MAX_SINGLE_VALUE`] occupy a single signed
//! byte holding the value itself. Everything else is written as one of the eight type codes below
//! `MIN_SINGLE_VALUE`, followed by the value in the width the code names.
//!
//! | value                          | bytes |
//! |--------------------------------|-------|
//! | `-120..=127`                   | 1     |
//! | `u8` above 127, `-128..=-121`  | 2     |
//! | up to `u16::MAX`, `i16::MIN..` | 3     |
//! | up to `u32::MAX`, `i32::MIN..` | 5     |
//! | anything else                  | 9     |

pub const MAX_SINGLE_VALUE: i8 = 127;
pub const MIN_SINGLE_VALUE: i8 = -120;

/// Upper bound of the encoded size of any VarInt.
pub const MAX_VAR_INT_SIZE: usize = 9;

#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarIntCode {
    Byte = -121,
    SByte = -122,
    UInt16 = -123,
    Int16 = -124,
    UInt32 = -125,
    Int32 = -126,
    UInt64 = -127,
    Int64 = -128,
}

impl VarIntCode {

    /// Returns the code for a lead byte, `None` if the lead byte is a value of its own.
    pub fn from_lead(lead: i8) -> Option<Self> {
        match lead {
            -121 => Some(VarIntCode::Byte),
            -122 => Some(VarIntCode::SByte),
            -123 => Some(VarIntCode::UInt16),
            -124 => Some(VarIntCode::Int16),
            -125 => Some(VarIntCode::UInt32),
            -126 => Some(VarIntCode::Int32),
            -127 => Some(VarIntCode::UInt64),
            -128 => Some(VarIntCode::Int64),
            _    => None,
        }
    }

    /// The number of payload bytes following the code.
    pub const fn width(self) -> usize {
        match self {
            VarIntCode::Byte | VarIntCode::SByte    => 1,
            VarIntCode::UInt16 | VarIntCode::Int16  => 2,
            VarIntCode::UInt32 | VarIntCode::Int32  => 4,
            VarIntCode::UInt64 | VarIntCode::Int64  => 8,
        }
    }

    /// Selects the code for `value`, `None` if it fits into the lead byte.
    fn select(value: i128, byte_sized: bool) -> Option<Self> {
        if (MIN_SINGLE_VALUE as i128..=MAX_SINGLE_VALUE as i128).contains(&value) {
            None
        } else if value >= 0 {
            Some(if byte_sized && value <= u8::MAX as i128 {
                VarIntCode::Byte
            } else if value <= u16::MAX as i128 {
                VarIntCode::UInt16
            } else if value <= u32::MAX as i128 {
                VarIntCode::UInt32
            } else {
                VarIntCode::UInt64
            })
        } else {
            Some(if value >= i8::MIN as i128 {
                VarIntCode::SByte
            } else if value >= i16::MIN as i128 {
                VarIntCode::Int16
            } else if value >= i32::MIN as i128 {
                VarIntCode::Int32
            } else {
                VarIntCode::Int64
            })
        }
    }

    /// Writes `value` in this code's width. `out` must be exactly `self.width()` long.
    fn put(self, value: i128, out: &mut [u8]) {
        match self {
            VarIntCode::Byte   => out.copy_from_slice(&(value as u8).to_le_bytes()),
            VarIntCode::SByte  => out.copy_from_slice(&(value as i8).to_le_bytes()),
            VarIntCode::UInt16 => out.copy_from_slice(&(value as u16).to_le_bytes()),
            VarIntCode::Int16  => out.copy_from_slice(&(value as i16).to_le_bytes()),
            VarIntCode::UInt32 => out.copy_from_slice(&(value as u32).to_le_bytes()),
            VarIntCode::Int32  => out.copy_from_slice(&(value as i32).to_le_bytes()),
            VarIntCode::UInt64 => out.copy_from_slice(&(value as u64).to_le_bytes()),
            VarIntCode::Int64  => out.copy_from_slice(&(value as i64).to_le_bytes()),
        }
    }

    /// Reads a value of this code's width. `bytes` must be exactly `self.width()` long.
    pub(crate) fn get(self, bytes: &[u8]) -> i128 {
        let mut tmp = [0u8; 8];
        tmp[..bytes.len()].copy_from_slice(bytes);
        match self {
            VarIntCode::Byte   => tmp[0] as i128,
            VarIntCode::SByte  => tmp[0] as i8 as i128,
            VarIntCode::UInt16 => u16::from_le_bytes([tmp[0], tmp[1]]) as i128,
            VarIntCode::Int16  => i16::from_le_bytes([tmp[0], tmp[1]]) as i128,
            VarIntCode::UInt32 => u32::from_le_bytes([tmp[0], tmp[1], tmp[2], tmp[3]]) as i128,
            VarIntCode::Int32  => i32::from_le_bytes([tmp[0], tmp[1], tmp[2], tmp[3]]) as i128,
            VarIntCode::UInt64 => u64::from_le_bytes(tmp) as i128,
            VarIntCode::Int64  => i64::from_le_bytes(tmp) as i128,
        }
    }

}

/// An integer type which can be written as a VarInt.
pub trait VarInt: Copy {
    const TYPE_NAME: &'static str;
    /// One byte types encode large values with the one byte codes.
    const BYTE_SIZED: bool = false;

    fn to_wide(self) -> i128;

    /// Narrows a decoded value, `None` if it does not fit.
    fn from_wide(value: i128) -> Option<Self>;
}

macro_rules! var_int {
    ($($t:ty => $byte_sized:expr),* $(,)?) => {
        $(
            impl VarInt for $t {
                const TYPE_NAME: &'static str = stringify!($t);
                const BYTE_SIZED: bool = $byte_sized;

                #[inline]
                fn to_wide(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn from_wide(value: i128) -> Option<Self> {
                    <$t>::try_from(value).ok()
                }
            }
        )*
    };
}

var_int! {
    u8 => true, i8 => true,
    u16 => false, i16 => false,
    u32 => false, i32 => false,
    u64 => false, i64 => false,
    usize => false, isize => false,
}

/// Returns the number of bytes `value` occupies on wire.
#[inline]
pub fn size_of<T: VarInt>(value: T) -> usize {
    match VarIntCode::select(value.to_wide(), T::BYTE_SIZED) {
        None       => 1,
        Some(code) => 1 + code.width(),
    }
}

/// Encodes `value` into a scratch buffer and returns it together with the number of used bytes.
pub(crate) fn encode<T: VarInt>(value: T) -> ([u8; MAX_VAR_INT_SIZE], usize) {
    let wide = value.to_wide();
    let mut buf = [0u8; MAX_VAR_INT_SIZE];
    match VarIntCode::select(wide, T::BYTE_SIZED) {
        None => {
            buf[0] = wide as i8 as u8;
            (buf, 1)
        },
        Some(code) => {
            buf[0] = code as i8 as u8;
            code.put(wide, &mut buf[1..1 + code.width()]);
            (buf, 1 + code.width())
        },
    }
}
