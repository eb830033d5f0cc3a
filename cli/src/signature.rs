//! Existing-signature detection.
//!
//! Looks for well-known filesystem and partition-table magic in the first
//! [`PROBE_WINDOW`] bytes of the device. Filesystems and volume members are
//! reported before partition tables. A window that matches nothing but is not
//! blank is reported as an unknown signature, never as clean.
//!
//! Formats whose only superblock sits at the end of the device (md 0.90 and
//! 1.0) fall into the unknown case when their payload is not blank.

use std::fmt;
use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

/// Bytes read from the start of the device
pub const PROBE_WINDOW: usize = 136 * 1024;

/// What was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    /// A filesystem or other superblock
    Filesystem,
    /// A partition table
    PartitionTable,
    /// Data that matches no known format
    Unknown,
}

/// A detected signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Category
    pub kind: SignatureKind,
    /// Type name as reported by blkid-style tools
    pub name: &'static str,
}

impl Signature {
    const fn filesystem(name: &'static str) -> Self {
        Self { kind: SignatureKind::Filesystem, name }
    }

    const fn partition_table(name: &'static str) -> Self {
        Self { kind: SignatureKind::PartitionTable, name }
    }

    const fn unknown() -> Self {
        Self { kind: SignatureKind::Unknown, name: "unknown" }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SignatureKind::Filesystem => write!(f, "existing file system ({})", self.name),
            SignatureKind::PartitionTable => write!(f, "existing partition ({})", self.name),
            SignatureKind::Unknown => write!(f, "existing signature"),
        }
    }
}

/// Read the probe window from `file` and look for a signature
pub fn probe(file: &File) -> io::Result<Option<Signature>> {
    let mut window = vec![0u8; PROBE_WINDOW];
    let mut filled = 0;
    while filled < window.len() {
        match file.read_at(&mut window[filled..], filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    window.truncate(filled);
    Ok(detect(&window))
}

/// Look for a signature in the leading bytes of a device
pub fn detect(buf: &[u8]) -> Option<Signature> {
    detect_filesystem(buf)
        .or_else(|| detect_volume_member(buf))
        .or_else(|| detect_partition_table(buf))
        .or_else(|| buf.iter().any(|&b| b != 0).then(Signature::unknown))
}

fn detect_filesystem(buf: &[u8]) -> Option<Signature> {
    if has(buf, 0, b"LUKS\xba\xbe") {
        return Some(Signature::filesystem("crypto_LUKS"));
    }
    if has(buf, 0, b"XFSB") {
        return Some(Signature::filesystem("xfs"));
    }
    if let Some(name) = ext_variant(buf) {
        return Some(Signature::filesystem(name));
    }
    if has(buf, 65536 + 64, b"_BHRfS_M") {
        return Some(Signature::filesystem("btrfs"));
    }
    if has(buf, 3, b"EXFAT   ") {
        return Some(Signature::filesystem("exfat"));
    }
    if has(buf, 1024, &0xF2F5_2010u32.to_le_bytes()) {
        return Some(Signature::filesystem("f2fs"));
    }
    if has(buf, 3, b"NTFS    ") {
        return Some(Signature::filesystem("ntfs"));
    }
    if has_boot_signature(buf)
        && (has(buf, 54, b"FAT12   ") || has(buf, 54, b"FAT16   ") || has(buf, 82, b"FAT32   "))
    {
        return Some(Signature::filesystem("vfat"));
    }
    if has(buf, 32769, b"CD001") {
        return Some(Signature::filesystem("iso9660"));
    }
    for page_size in [4096usize, 8192, 16384, 65536] {
        let at = page_size - 10;
        if has(buf, at, b"SWAPSPACE2") || has(buf, at, b"SWAP-SPACE") {
            return Some(Signature::filesystem("swap"));
        }
    }
    None
}

/// LVM, md-raid, bcache and ZFS members
fn detect_volume_member(buf: &[u8]) -> Option<Signature> {
    const MD_MAGIC: u32 = 0xA92B_4EFC;
    const BCACHE_MAGIC: [u8; 16] = [
        0xC6, 0x85, 0x73, 0xF6, 0x4E, 0x1A, 0x45, 0xCA, 0x82, 0x65, 0xF5, 0x7F, 0x48, 0xBA, 0x6D,
        0x81,
    ];
    const ZFS_UBERBLOCK: usize = 128 * 1024;
    const ZFS_MAGIC: u64 = 0x00BA_B10C;

    // LVM2 label may sit in any of the first four sectors
    if (0..4).any(|sector| {
        let at = sector * 512;
        has(buf, at, b"LABELONE") && has(buf, at + 24, b"LVM2 001")
    }) {
        return Some(Signature::filesystem("LVM2_member"));
    }
    // md 1.1 at the start, 1.2 at 4 KiB
    if has(buf, 0, &MD_MAGIC.to_le_bytes()) || has(buf, 4096, &MD_MAGIC.to_le_bytes()) {
        return Some(Signature::filesystem("linux_raid_member"));
    }
    if has(buf, 4096 + 24, &BCACHE_MAGIC) {
        return Some(Signature::filesystem("bcache"));
    }
    if has(buf, ZFS_UBERBLOCK, &ZFS_MAGIC.to_le_bytes())
        || has(buf, ZFS_UBERBLOCK, &ZFS_MAGIC.to_be_bytes())
    {
        return Some(Signature::filesystem("zfs_member"));
    }
    None
}

fn detect_partition_table(buf: &[u8]) -> Option<Signature> {
    if has(buf, 512, b"EFI PART") || has(buf, 4096, b"EFI PART") {
        return Some(Signature::partition_table("gpt"));
    }
    if has_boot_signature(buf) && (0..4).any(|i| buf[446 + 16 * i + 4] != 0) {
        return Some(Signature::partition_table("dos"));
    }
    None
}

/// ext2/3/4 superblock at 1024, told apart by feature flags
fn ext_variant(buf: &[u8]) -> Option<&'static str> {
    const SB: usize = 1024;
    const MAGIC: usize = SB + 56;
    const FEATURE_COMPAT: usize = SB + 92;
    const FEATURE_INCOMPAT: usize = SB + 96;

    const COMPAT_HAS_JOURNAL: u32 = 0x0004;
    // extents | 64bit | flex_bg
    const INCOMPAT_EXT4: u32 = 0x0040 | 0x0080 | 0x0200;

    if !has(buf, MAGIC, &0xEF53u16.to_le_bytes()) {
        return None;
    }
    let compat = le32(buf, FEATURE_COMPAT)?;
    let incompat = le32(buf, FEATURE_INCOMPAT)?;

    Some(if incompat & INCOMPAT_EXT4 != 0 {
        "ext4"
    } else if compat & COMPAT_HAS_JOURNAL != 0 {
        "ext3"
    } else {
        "ext2"
    })
}

fn has_boot_signature(buf: &[u8]) -> bool {
    has(buf, 510, &[0x55, 0xAA])
}

fn has(buf: &[u8], offset: usize, magic: &[u8]) -> bool {
    buf.get(offset..offset + magic.len()) == Some(magic)
}

fn le32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
