//! The byte-level grammar shared by the [`Evaluator`](crate::Evaluator), the [`Writer`](crate::Writer) and the
//! [`Reader`](crate::Reader). All multi-byte quantities are little-endian and stored unaligned.
//!
//! An object starts with a single byte: either its member count (`0..=249`), [`REFERENCE_ID`] followed by a
//! [VarInt](crate::varint) id of a previously written instance, or [`NULL_OBJECT`]. Collections start with a four
//! byte signed length where [`NULL_COLLECTION`] signals the absence of the collection and zero an empty one. Unions
//! start with their tag: one byte below [`WIDE_TAG`], otherwise `WIDE_TAG` and the tag as `u16`.

/// Marks an absent object where its member count would be.
pub const NULL_OBJECT: u8 = 255;

/// Announces a back-reference to an object which was already written during the same call.
pub const REFERENCE_ID: u8 = 250;

/// The largest member count an object header can carry.
pub const MAX_MEMBER_COUNT: u8 = 249;

/// Collection length which signals an absent collection.
pub const NULL_COLLECTION: i32 = -1;

/// Size of the collection header.
pub const COLLECTION_HEADER_SIZE: usize = 4;

/// Tags at or above this value are written as this byte followed by a `u16`.
pub const WIDE_TAG: u8 = 255;

/// Wide tag value which stands for an absent union instance.
pub const NULL_UNION_TAG: u16 = u16::MAX;

/// Null marker of token-recorded Utf-8 strings. `0xff` never occurs in valid Utf-8.
pub const NULL_UTF8_TOKEN: u8 = 0xff;

/// Null marker of token-recorded Utf-16 strings: an unpaired low surrogate.
pub const NULL_UTF16_TOKEN: u16 = 0xdfff;

/// The member count of an object. Constructing one with more than [`MAX_MEMBER_COUNT`] members in a const context
/// fails to compile.
///
/// ```
/// use luminpack::MemberCount;
/// const POINT: MemberCount = MemberCount::new(2);
/// assert_eq!(2, POINT.get());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberCount(u8);

impl MemberCount {

    pub const fn new(count: u8) -> Self {
        assert!(count <= MAX_MEMBER_COUNT, "objects carry at most 249 members");
        Self(count)
    }

    /// Returns `None` for counts above [`MAX_MEMBER_COUNT`].
    pub const fn checked(count: usize) -> Option<Self> {
        if count <= MAX_MEMBER_COUNT as usize {
            Some(Self(count as u8))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

}

/// The decoded first byte (or bytes) of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectHeader {
    /// No instance
    Null,
    /// An instance with the given number of members follows
    Members(u8),
    /// The instance was already read and can be looked up by this id
    Reference(u32),
}

/// Returns the number of bytes a union header for `tag` occupies.
#[inline]
pub const fn union_header_size(tag: u16) -> usize {
    if tag < WIDE_TAG as u16 {
        1
    } else {
        3
    }
}

/// Returns the number of bytes the collection header and the raw payload of `len` elements of `size` bytes occupy.
#[inline]
pub(crate) fn unmanaged_collection_size(len: usize, size: usize) -> usize {
    COLLECTION_HEADER_SIZE + len * size
}
