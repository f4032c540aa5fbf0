use dx8_gpu::GpuError;

use crate::d3d8;

/// Failure result of an API call. `Ok(_)` plays the role of `D3D_OK`.
#[derive(Debug, thiserror::Error)]
pub enum D3dError {
    #[error("invalid call: {0}")]
    InvalidCall(&'static str),
    #[error("wrong texture format {0}")]
    WrongTextureFormat(u32),
    #[error("not available: {0}")]
    NotAvailable(&'static str),
    #[error("device lost")]
    DeviceLost,
    #[error(transparent)]
    Gpu(GpuError),
}

pub type D3dResult<T> = Result<T, D3dError>;

impl D3dError {
    /// The legacy `HRESULT` for this failure.
    pub fn hresult(&self) -> u32 {
        match self {
            Self::InvalidCall(_) | Self::Gpu(_) => d3d8::D3DERR_INVALIDCALL,
            Self::WrongTextureFormat(_) => d3d8::D3DERR_WRONGTEXTUREFORMAT,
            Self::NotAvailable(_) => d3d8::D3DERR_NOTAVAILABLE,
            Self::DeviceLost => d3d8::D3DERR_DEVICELOST,
        }
    }
}

impl From<GpuError> for D3dError {
    fn from(err: GpuError) -> Self {
        match err {
            // A surface the adapter cannot present to is reported the legacy way.
            GpuError::UnsupportedSurface { .. } => {
                Self::WrongTextureFormat(crate::format::D3dFormat::A8R8G8B8.raw())
            }
            GpuError::SurfaceLost => Self::DeviceLost,
            other => Self::Gpu(other),
        }
    }
}

/// Flattens a call result into the legacy `HRESULT`.
pub fn hresult_of<T>(result: &D3dResult<T>) -> u32 {
    match result {
        Ok(_) => d3d8::D3D_OK,
        Err(err) => err.hresult(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hresults_match_legacy_codes() {
        assert_eq!(D3dError::InvalidCall("x").hresult(), 0x8876_086C);
        assert_eq!(D3dError::WrongTextureFormat(0).hresult(), 0x8876_0818);
        assert_eq!(hresult_of(&Ok::<(), D3dError>(())), 0);
    }

    #[test]
    fn unsupported_surface_maps_to_wrong_texture_format() {
        let err = D3dError::from(GpuError::UnsupportedSurface {
            width: 800,
            height: 600,
        });
        assert!(matches!(err, D3dError::WrongTextureFormat(21)));
        assert!(matches!(
            D3dError::from(GpuError::SurfaceLost),
            D3dError::DeviceLost
        ));
    }
}
