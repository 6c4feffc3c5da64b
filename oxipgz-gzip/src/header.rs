//! Gzip member header signature and the size-hint field.
//!
//! The 4-byte MTIME field of a member header is free-form. Members written
//! with [`SizeHintMode::BlockLengthInHeader`](oxipgz_core::SizeHintMode)
//! store their own total length there, little-endian, so a reader can skip
//! to the next member without inflating.

use crate::mask::{ByteMask, ByteSignature};

/// Gzip magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Gzip compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Length of the fixed member header.
pub const HEADER_LEN: usize = 10;

/// Position of the size hint inside the header.
pub const SIZE_HINT_RANGE: std::ops::Range<usize> = 4..8;

/// OS byte values recognized as a member header.
pub mod os {
    /// FAT filesystem (MS-DOS, OS/2, NT/Win32).
    pub const FAT: u8 = 0;
    /// Amiga.
    pub const AMIGA: u8 = 1;
    /// VMS.
    pub const VMS: u8 = 2;
    /// Unix.
    pub const UNIX: u8 = 3;
    /// VM/CMS.
    pub const VM_CMS: u8 = 4;
    /// Atari TOS.
    pub const ATARI_TOS: u8 = 5;
    /// HPFS filesystem.
    pub const HPFS: u8 = 6;
    /// Macintosh.
    pub const MACINTOSH: u8 = 7;
    /// Z-System.
    pub const Z_SYSTEM: u8 = 8;
    /// CP/M.
    pub const CP_M: u8 = 9;
    /// TOPS-20.
    pub const TOPS_20: u8 = 10;
    /// NTFS filesystem.
    pub const NTFS: u8 = 11;
    /// QDOS.
    pub const QDOS: u8 = 12;
    /// Acorn RISCOS.
    pub const ACORN_RISCOS: u8 = 13;
    /// OS X.
    pub const OSX: u8 = 19;
    /// Unknown.
    pub const UNKNOWN: u8 = 255;

    /// Every accepted value.
    pub const ALL: &[u8] = &[
        FAT,
        AMIGA,
        VMS,
        UNIX,
        VM_CMS,
        ATARI_TOS,
        HPFS,
        MACINTOSH,
        Z_SYSTEM,
        CP_M,
        TOPS_20,
        NTFS,
        QDOS,
        ACORN_RISCOS,
        OSX,
        UNKNOWN,
    ];
}

/// Byte pattern of a member header: magic, DEFLATE method, six free bytes
/// and a known OS value.
pub const MEMBER_SIGNATURE: ByteSignature<HEADER_LEN> = ByteSignature::new([
    ByteMask::Exact(GZIP_MAGIC[0]),
    ByteMask::Exact(GZIP_MAGIC[1]),
    ByteMask::Exact(CM_DEFLATE),
    ByteMask::Any,
    ByteMask::Any,
    ByteMask::Any,
    ByteMask::Any,
    ByteMask::Any,
    ByteMask::Any,
    ByteMask::OneOf(os::ALL),
]);

/// Whether `bytes` starts with a member header.
pub fn is_header(bytes: &[u8]) -> bool {
    MEMBER_SIGNATURE.is_match(bytes)
}

/// Offsets of every non-overlapping member header in `bytes`.
pub fn find_headers(bytes: &[u8]) -> Vec<usize> {
    MEMBER_SIGNATURE.find_all(bytes)
}

/// Read the size hint of the header at the start of `bytes`.
///
/// A zero field means no hint. Returns `None` when `bytes` is shorter than a
/// header.
pub fn read_size_hint(bytes: &[u8]) -> Option<u32> {
    let field: [u8; 4] = bytes.get(SIZE_HINT_RANGE)?.try_into().ok()?;
    match u32::from_le_bytes(field) {
        0 => None,
        hint => Some(hint),
    }
}

/// Store `hint` in the header at the start of `member`.
///
/// Returns `false` when `member` is shorter than a header.
pub fn write_size_hint(member: &mut [u8], hint: u32) -> bool {
    match member.get_mut(SIZE_HINT_RANGE) {
        Some(field) => {
            field.copy_from_slice(&hint.to_le_bytes());
            true
        }
        None => false,
    }
}
