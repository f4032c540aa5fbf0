//! Flexible vertex format (`D3DFVF_*`) decoding.

use bitflags::bitflags;

bitflags! {
    /// A `D3DFVF_*` bitmask. Bits are the legacy values so content files decode unchanged.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Fvf: u32 {
        const XYZ = 0x002;
        const XYZB4 = 0x00C;
        const NORMAL = 0x010;
        const PSIZE = 0x020;
        const DIFFUSE = 0x040;
        const SPECULAR = 0x080;
        const TEX1 = 0x100;
        const TEX2 = 0x200;
        const LASTBETA_UBYTE4 = 0x1000;

        const _ = !0;
    }
}

impl Fvf {
    pub const POSITION_MASK: u32 = 0x00E;
    pub const TEXCOUNT_MASK: u32 = 0xF00;
    pub const TEXCOUNT_SHIFT: u32 = 8;

    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }

    /// # Panics
    ///
    /// On position codes other than `XYZ` and `XYZB4`.
    pub fn position(self) -> PositionType {
        match self.bits() & Self::POSITION_MASK {
            0 => PositionType::None,
            0x002 => PositionType::Xyz,
            0x00C => PositionType::XyzB4,
            other => panic!("unsupported FVF position type {other:#x}"),
        }
    }

    pub fn tex_count(self) -> u32 {
        (self.bits() & Self::TEXCOUNT_MASK) >> Self::TEXCOUNT_SHIFT
    }

    /// Raw `D3DFVF_TEXCOORDSIZEn` code for set `index` (0 means two components).
    pub fn tex_coord_size_code(self, index: u32) -> u32 {
        (self.bits() >> (16 + index * 2)) & 0x3
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionType {
    None,
    Xyz,
    /// Position followed by four blend values.
    XyzB4,
}

/// Vertex inputs of the fixed-function shader, in vertex-buffer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    BlendWeights,
    BlendIndices,
    Normal,
    Specular,
    Diffuse,
    TexCoord0,
    TexCoord1,
}

impl VertexAttribute {
    pub const ALL: [Self; 8] = [
        Self::Position,
        Self::BlendWeights,
        Self::BlendIndices,
        Self::Normal,
        Self::Specular,
        Self::Diffuse,
        Self::TexCoord0,
        Self::TexCoord1,
    ];

    /// `@location` in the fixed-function WGSL.
    pub fn shader_location(self) -> u32 {
        match self {
            Self::Position => 0,
            Self::BlendWeights => 1,
            Self::BlendIndices => 2,
            Self::Normal => 3,
            Self::Diffuse => 4,
            Self::Specular => 5,
            Self::TexCoord0 => 6,
            Self::TexCoord1 => 7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeLayout {
    pub attribute: VertexAttribute,
    pub offset: u64,
    pub format: wgpu::VertexFormat,
}

/// Byte layout of one vertex described by an [`Fvf`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexFormatDescriptor {
    pub attributes: Vec<AttributeLayout>,
    pub stride: u64,
}

impl VertexFormatDescriptor {
    /// # Panics
    ///
    /// The layout only covers what the fixed-function path supports: more than two texture
    /// coordinate sets, non-2D texture coordinates and blend position codes other than `XYZB4`
    /// are programming errors.
    pub fn new(fvf: Fvf) -> Self {
        let mut desc = Self {
            attributes: Vec::with_capacity(VertexAttribute::ALL.len()),
            stride: 0,
        };

        match fvf.position() {
            PositionType::None => {}
            PositionType::Xyz => desc.push(VertexAttribute::Position, wgpu::VertexFormat::Float32x3),
            PositionType::XyzB4 => {
                desc.push(VertexAttribute::Position, wgpu::VertexFormat::Float32x3);
                if fvf.contains(Fvf::LASTBETA_UBYTE4) {
                    desc.push(VertexAttribute::BlendWeights, wgpu::VertexFormat::Float32x3);
                    desc.push(VertexAttribute::BlendIndices, wgpu::VertexFormat::Uint8x4);
                } else {
                    desc.push(VertexAttribute::BlendWeights, wgpu::VertexFormat::Float32x4);
                }
            }
        }
        if fvf.contains(Fvf::NORMAL) {
            desc.push(VertexAttribute::Normal, wgpu::VertexFormat::Float32x3);
        }
        if fvf.contains(Fvf::SPECULAR) {
            desc.push(VertexAttribute::Specular, wgpu::VertexFormat::Unorm8x4);
        }
        if fvf.contains(Fvf::DIFFUSE) {
            desc.push(VertexAttribute::Diffuse, wgpu::VertexFormat::Unorm8x4);
        }

        let tex_count = fvf.tex_count();
        assert!(
            tex_count <= 2,
            "FVF {:#x} declares {tex_count} texture coordinate sets; at most 2 are supported",
            fvf.bits()
        );
        for (index, attribute) in [VertexAttribute::TexCoord0, VertexAttribute::TexCoord1]
            .into_iter()
            .enumerate()
            .take(tex_count as usize)
        {
            let code = fvf.tex_coord_size_code(index as u32);
            assert!(
                code == 0,
                "FVF {:#x}: texture coordinate set {index} is not 2D (size code {code})",
                fvf.bits()
            );
            desc.push(attribute, wgpu::VertexFormat::Float32x2);
        }

        desc
    }

    fn push(&mut self, attribute: VertexAttribute, format: wgpu::VertexFormat) {
        self.attributes.push(AttributeLayout {
            attribute,
            offset: self.stride,
            format,
        });
        self.stride += format.size();
    }

    pub fn attribute(&self, attribute: VertexAttribute) -> Option<&AttributeLayout> {
        self.attributes.iter().find(|a| a.attribute == attribute)
    }
}
