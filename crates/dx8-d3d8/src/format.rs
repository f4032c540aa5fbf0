//! `D3DFORMAT` decoding: bits per pixel, backend texture formats and upload conversion.

use std::borrow::Cow;

const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

macro_rules! d3d_formats {
    ($($name:ident = $value:expr,)*) => {
        /// Pixel formats known to the legacy API, with their on-disk numeric values.
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum D3dFormat {
            $($name,)*
        }

        impl D3dFormat {
            pub fn from_raw(raw: u32) -> Option<Self> {
                $(if raw == $value {
                    return Some(Self::$name);
                })*
                None
            }

            pub fn raw(self) -> u32 {
                match self {
                    $(Self::$name => $value,)*
                }
            }
        }
    };
}

d3d_formats! {
    R8G8B8 = 20,
    A8R8G8B8 = 21,
    X8R8G8B8 = 22,
    R5G6B5 = 23,
    X1R5G5B5 = 24,
    A1R5G5B5 = 25,
    A4R4G4B4 = 26,
    R3G3B2 = 27,
    A8 = 28,
    A8R3G3B2 = 29,
    X4R4G4B4 = 30,
    A8P8 = 40,
    P8 = 41,
    L8 = 50,
    A8L8 = 51,
    A4L4 = 52,
    V8U8 = 60,
    L6V5U5 = 61,
    X8L8V8U8 = 62,
    Q8W8V8U8 = 63,
    V16U16 = 64,
    W11V11U10 = 65,
    UYVY = fourcc(b"UYVY"),
    YUY2 = fourcc(b"YUY2"),
    DXT1 = fourcc(b"DXT1"),
    DXT2 = fourcc(b"DXT2"),
    DXT3 = fourcc(b"DXT3"),
    DXT4 = fourcc(b"DXT4"),
    DXT5 = fourcc(b"DXT5"),
    D16_LOCKABLE = 70,
    D32 = 71,
    D15S1 = 73,
    D24S8 = 75,
    D24X8 = 77,
    D24X4S4 = 79,
    D16 = 80,
    VERTEXDATA = 100,
    INDEX16 = 101,
    INDEX32 = 102,
}

/// Bits per pixel of a raw `D3DFORMAT`; 0 when the format has no fixed size or is unknown.
pub fn bits_per_pixel(raw: u32) -> u32 {
    D3dFormat::from_raw(raw).map_or(0, D3dFormat::bits_per_pixel)
}

impl D3dFormat {
    pub fn bits_per_pixel(self) -> u32 {
        use D3dFormat::*;
        match self {
            L8 | A8 | P8 | R3G3B2 | A4L4 => 8,
            R5G6B5 | X1R5G5B5 | A1R5G5B5 | A4R4G4B4 | A8R3G3B2 | X4R4G4B4 | A8P8 | A8L8
            | V8U8 | L6V5U5 => 16,
            // Content treats R8G8B8 as a 32-bit layout.
            R8G8B8 | X8R8G8B8 | A8R8G8B8 | X8L8V8U8 => 32,
            INDEX16 | D16 | D15S1 => 16,
            D32 | D24X8 | D24S8 | D24X4S4 => 32,
            DXT1 => 4,
            DXT2 | DXT3 | DXT4 | DXT5 => 8,
            INDEX32 | D16_LOCKABLE | Q8W8V8U8 | V16U16 | W11V11U10 | UYVY | YUY2
            | VERTEXDATA => 0,
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            Self::DXT1 | Self::DXT2 | Self::DXT3 | Self::DXT4 | Self::DXT5
        )
    }

    /// Bytes per 4x4 block for block-compressed formats.
    pub fn block_bytes(self) -> Option<u32> {
        match self {
            Self::DXT1 => Some(8),
            Self::DXT2 | Self::DXT3 | Self::DXT4 | Self::DXT5 => Some(16),
            _ => None,
        }
    }

    /// Backend format a texture of this format is stored in, if it can be sampled at all.
    ///
    /// Direct color formats are widened to BGRA8 on upload. DXT2/DXT4 are the premultiplied
    /// variants of DXT3/DXT5 and share their block layout.
    pub fn texture_format(self) -> Option<wgpu::TextureFormat> {
        match self {
            Self::DXT1 => Some(wgpu::TextureFormat::Bc1RgbaUnorm),
            Self::DXT2 | Self::DXT3 => Some(wgpu::TextureFormat::Bc2RgbaUnorm),
            Self::DXT4 | Self::DXT5 => Some(wgpu::TextureFormat::Bc3RgbaUnorm),
            _ => self
                .color_layout()
                .map(|_| wgpu::TextureFormat::Bgra8Unorm),
        }
    }

    pub fn color_layout(self) -> Option<ColorLayout> {
        use D3dFormat::*;
        Some(match self {
            A8R8G8B8 => ColorLayout::Bgra8,
            X8R8G8B8 | R8G8B8 => ColorLayout::Bgrx8,
            R5G6B5 => ColorLayout::R5G6B5,
            X1R5G5B5 => ColorLayout::X1R5G5B5,
            A1R5G5B5 => ColorLayout::A1R5G5B5,
            A4R4G4B4 => ColorLayout::A4R4G4B4,
            X4R4G4B4 => ColorLayout::X4R4G4B4,
            R3G3B2 => ColorLayout::R3G3B2,
            A8R3G3B2 => ColorLayout::A8R3G3B2,
            A8 => ColorLayout::A8,
            L8 => ColorLayout::L8,
            A8L8 => ColorLayout::A8L8,
            A4L4 => ColorLayout::A4L4,
            _ => return None,
        })
    }

    /// Size of a tightly packed `width`x`height` image in this format, or `None` when it does
    /// not fit the 32-bit size of a surface description.
    pub fn image_byte_len(self, width: u32, height: u32) -> Option<usize> {
        let (width, height) = (u64::from(width), u64::from(height));
        let bytes = match self.block_bytes() {
            Some(block_bytes) => width
                .div_ceil(4)
                .max(1)
                .checked_mul(height.div_ceil(4).max(1))?
                .checked_mul(u64::from(block_bytes))?,
            None => {
                width
                    .checked_mul(height)?
                    .checked_mul(u64::from(self.bits_per_pixel()))?
                    / 8
            }
        };
        let bytes = u32::try_from(bytes).ok()?;
        usize::try_from(bytes).ok()
    }

    /// Converts legacy pixel data into the bytes the backend texture expects.
    pub fn to_backend_bytes<'a>(self, src: &'a [u8]) -> Cow<'a, [u8]> {
        match self.color_layout() {
            Some(layout) => layout.to_bgra8(src),
            None => Cow::Borrowed(src),
        }
    }
}

/// In-memory layout of the direct color formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorLayout {
    Bgra8,
    Bgrx8,
    R5G6B5,
    X1R5G5B5,
    A1R5G5B5,
    A4R4G4B4,
    X4R4G4B4,
    R3G3B2,
    A8R3G3B2,
    A8,
    L8,
    A8L8,
    A4L4,
}

fn expand(value: u32, bits: u32) -> u8 {
    let max = (1u32 << bits) - 1;
    ((value * 255 + max / 2) / max) as u8
}

impl ColorLayout {
    fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra8 | Self::Bgrx8 => 4,
            Self::R3G3B2 | Self::A8 | Self::L8 | Self::A4L4 => 1,
            _ => 2,
        }
    }

    /// Decodes one pixel into `[b, g, r, a]`.
    fn decode(self, px: &[u8]) -> [u8; 4] {
        let v = match px.len() {
            1 => u32::from(px[0]),
            2 => u32::from(u16::from_le_bytes([px[0], px[1]])),
            _ => u32::from_le_bytes([px[0], px[1], px[2], px[3]]),
        };
        match self {
            Self::Bgra8 => [px[0], px[1], px[2], px[3]],
            Self::Bgrx8 => [px[0], px[1], px[2], 0xff],
            Self::R5G6B5 => [
                expand(v & 0x1f, 5),
                expand((v >> 5) & 0x3f, 6),
                expand((v >> 11) & 0x1f, 5),
                0xff,
            ],
            Self::X1R5G5B5 | Self::A1R5G5B5 => [
                expand(v & 0x1f, 5),
                expand((v >> 5) & 0x1f, 5),
                expand((v >> 10) & 0x1f, 5),
                if self == Self::X1R5G5B5 || (v & 0x8000) != 0 {
                    0xff
                } else {
                    0
                },
            ],
            Self::A4R4G4B4 | Self::X4R4G4B4 => [
                expand(v & 0xf, 4),
                expand((v >> 4) & 0xf, 4),
                expand((v >> 8) & 0xf, 4),
                if self == Self::X4R4G4B4 {
                    0xff
                } else {
                    expand((v >> 12) & 0xf, 4)
                },
            ],
            Self::R3G3B2 => [
                expand(v & 0x3, 2),
                expand((v >> 2) & 0x7, 3),
                expand((v >> 5) & 0x7, 3),
                0xff,
            ],
            Self::A8R3G3B2 => [
                expand(v & 0x3, 2),
                expand((v >> 2) & 0x7, 3),
                expand((v >> 5) & 0x7, 3),
                (v >> 8) as u8,
            ],
            Self::A8 => [0, 0, 0, v as u8],
            Self::L8 => [v as u8, v as u8, v as u8, 0xff],
            Self::A8L8 => {
                let l = (v & 0xff) as u8;
                [l, l, l, (v >> 8) as u8]
            }
            Self::A4L4 => {
                let l = expand(v & 0xf, 4);
                [l, l, l, expand(v >> 4, 4)]
            }
        }
    }

    pub fn to_bgra8(self, src: &[u8]) -> Cow<'_, [u8]> {
        if self == Self::Bgra8 {
            return Cow::Borrowed(src);
        }
        let bpp = self.bytes_per_pixel();
        let mut out = Vec::with_capacity(src.len() / bpp * 4);
        for px in src.chunks_exact(bpp) {
            out.extend_from_slice(&self.decode(px));
        }
        Cow::Owned(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn raw_values_are_wire_compatible() {
        assert_eq!(D3dFormat::A8R8G8B8.raw(), 21);
        assert_eq!(D3dFormat::DXT1.raw(), 0x3154_5844);
        assert_eq!(D3dFormat::DXT5.raw(), 0x3554_5844);
        assert_eq!(D3dFormat::from_raw(101), Some(D3dFormat::INDEX16));
        assert_eq!(D3dFormat::from_raw(12345), None);
    }

    #[test]
    fn bits_per_pixel_table() {
        assert_eq!(bits_per_pixel(D3dFormat::A8R8G8B8.raw()), 32);
        assert_eq!(bits_per_pixel(D3dFormat::R8G8B8.raw()), 32);
        assert_eq!(bits_per_pixel(D3dFormat::A4R4G4B4.raw()), 16);
        assert_eq!(bits_per_pixel(D3dFormat::L8.raw()), 8);
        assert_eq!(bits_per_pixel(D3dFormat::DXT1.raw()), 4);
        assert_eq!(bits_per_pixel(D3dFormat::DXT3.raw()), 8);
        assert_eq!(bits_per_pixel(D3dFormat::D24S8.raw()), 32);
        assert_eq!(bits_per_pixel(0), 0);
        assert_eq!(bits_per_pixel(0xdead_beef), 0);
    }

    #[test]
    fn texture_formats_normalize_color_and_forward_dxt() {
        for format in [
            D3dFormat::A8R8G8B8,
            D3dFormat::X8R8G8B8,
            D3dFormat::R5G6B5,
            D3dFormat::A4R4G4B4,
            D3dFormat::L8,
        ] {
            assert_eq!(
                format.texture_format(),
                Some(wgpu::TextureFormat::Bgra8Unorm)
            );
        }
        assert_eq!(
            D3dFormat::DXT1.texture_format(),
            Some(wgpu::TextureFormat::Bc1RgbaUnorm)
        );
        assert_eq!(
            D3dFormat::DXT2.texture_format(),
            D3dFormat::DXT3.texture_format()
        );
        assert_eq!(
            D3dFormat::DXT4.texture_format(),
            Some(wgpu::TextureFormat::Bc3RgbaUnorm)
        );
        assert_eq!(D3dFormat::D24S8.texture_format(), None);
        assert_eq!(D3dFormat::P8.texture_format(), None);
    }

    #[test]
    fn image_byte_len_rounds_compressed_blocks() {
        assert_eq!(D3dFormat::A8R8G8B8.image_byte_len(4, 2), Some(32));
        assert_eq!(D3dFormat::R5G6B5.image_byte_len(4, 2), Some(16));
        assert_eq!(D3dFormat::DXT1.image_byte_len(8, 8), Some(32));
        assert_eq!(D3dFormat::DXT5.image_byte_len(2, 1), Some(16));
    }

    #[test]
    fn image_byte_len_does_not_overflow_large_surfaces() {
        assert_eq!(D3dFormat::A8R8G8B8.image_byte_len(16384, 8192), Some(1 << 29));
        assert_eq!(D3dFormat::R5G6B5.image_byte_len(16384, 16384), Some(1 << 29));
        assert_eq!(D3dFormat::A8R8G8B8.image_byte_len(65536, 65536), None);
        assert_eq!(D3dFormat::DXT5.image_byte_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn sixteen_bit_layouts_expand_to_bgra8() {
        // 0xF800 = pure red in R5G6B5.
        let red_src = 0xF800u16.to_le_bytes();
        let red = D3dFormat::R5G6B5.to_backend_bytes(&red_src);
        assert_eq!(&*red, &[0, 0, 255, 255]);

        // 0x8F00 = alpha 8/15, red 15/15 in A4R4G4B4.
        let argb_src = 0x8F00u16.to_le_bytes();
        let argb = D3dFormat::A4R4G4B4.to_backend_bytes(&argb_src);
        assert_eq!(&*argb, &[0, 0, 255, 136]);

        let transparent_src = 0x001Fu16.to_le_bytes();
        let transparent = D3dFormat::A1R5G5B5.to_backend_bytes(&transparent_src);
        assert_eq!(&*transparent, &[255, 0, 0, 0]);
    }

    #[test]
    fn bgra8_is_passed_through_and_x8_forces_alpha() {
        let src = [1u8, 2, 3, 4];
        assert!(matches!(
            D3dFormat::A8R8G8B8.to_backend_bytes(&src),
            Cow::Borrowed(_)
        ));
        assert_eq!(&*D3dFormat::X8R8G8B8.to_backend_bytes(&src), &[1, 2, 3, 255]);
    }

    #[test]
    fn luminance_layouts_replicate() {
        assert_eq!(&*D3dFormat::L8.to_backend_bytes(&[0x40]), &[0x40, 0x40, 0x40, 0xff]);
        assert_eq!(
            &*D3dFormat::A8L8.to_backend_bytes(&[0x10, 0x80]),
            &[0x10, 0x10, 0x10, 0x80]
        );
    }
}
