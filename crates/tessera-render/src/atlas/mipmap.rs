//! Mipmap chain sizing.

use crate::config::MipmapPolicy;

/// Number of mip levels for a texture whose larger side is `size`.
///
/// `FullChain` halves down to 1x1, giving `floor(log2(size)) + 1` levels.
/// `Floor { min_size }` stops before the larger side would drop below
/// `min_size`; a texture already at or below the floor gets a single level.
pub fn mip_level_count(size: u32, policy: MipmapPolicy) -> u32 {
    if size == 0 {
        return 1;
    }

    match policy {
        MipmapPolicy::FullChain => u32::BITS - size.leading_zeros(),
        MipmapPolicy::Floor { min_size } => {
            let min_size = min_size.max(1);
            let mut levels = 1;
            let mut extent = size;
            while extent / 2 >= min_size {
                extent /= 2;
                levels += 1;
            }
            levels
        }
    }
}

/// Extent of mip `level` for a base extent of `size`.
pub fn mip_extent(size: u32, level: u32) -> u32 {
    size.checked_shr(level).unwrap_or(0).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_chain() {
        assert_eq!(mip_level_count(1, MipmapPolicy::FullChain), 1);
        assert_eq!(mip_level_count(2, MipmapPolicy::FullChain), 2);
        assert_eq!(mip_level_count(64, MipmapPolicy::FullChain), 7);
        assert_eq!(mip_level_count(100, MipmapPolicy::FullChain), 7);
        assert_eq!(mip_level_count(1024, MipmapPolicy::FullChain), 11);
    }

    #[test]
    fn test_floor() {
        let floor = MipmapPolicy::Floor { min_size: 32 };
        assert_eq!(mip_level_count(256, floor), 4);
        assert_eq!(mip_level_count(32, floor), 1);
        assert_eq!(mip_level_count(16, floor), 1);
        assert_eq!(mip_level_count(100, floor), 2);
    }

    #[test]
    fn test_floor_of_one_is_full_chain() {
        let floor = MipmapPolicy::Floor { min_size: 1 };
        for size in [1, 3, 64, 500] {
            assert_eq!(
                mip_level_count(size, floor),
                mip_level_count(size, MipmapPolicy::FullChain)
            );
        }
    }

    #[test]
    fn test_mip_extent() {
        assert_eq!(mip_extent(64, 0), 64);
        assert_eq!(mip_extent(64, 3), 8);
        assert_eq!(mip_extent(64, 10), 1);
        assert_eq!(mip_extent(64, 40), 1);
    }
}
