//! Raw Direct3D 8 enumerant values, exactly as they appear in `d3d8types.h` and in serialized
//! content.

// D3DRENDERSTATETYPE
pub const D3DRS_ZENABLE: u32 = 7;
pub const D3DRS_FILLMODE: u32 = 8;
pub const D3DRS_SHADEMODE: u32 = 9;
pub const D3DRS_ZWRITEENABLE: u32 = 14;
pub const D3DRS_ALPHATESTENABLE: u32 = 15;
pub const D3DRS_SRCBLEND: u32 = 19;
pub const D3DRS_DESTBLEND: u32 = 20;
pub const D3DRS_CULLMODE: u32 = 22;
pub const D3DRS_ZFUNC: u32 = 23;
pub const D3DRS_ALPHAREF: u32 = 24;
pub const D3DRS_ALPHAFUNC: u32 = 25;
pub const D3DRS_DITHERENABLE: u32 = 26;
pub const D3DRS_ALPHABLENDENABLE: u32 = 27;
pub const D3DRS_FOGENABLE: u32 = 28;
pub const D3DRS_SPECULARENABLE: u32 = 29;
pub const D3DRS_FOGCOLOR: u32 = 34;
pub const D3DRS_ZBIAS: u32 = 47;
pub const D3DRS_STENCILENABLE: u32 = 52;
pub const D3DRS_TEXTUREFACTOR: u32 = 60;
pub const D3DRS_LIGHTING: u32 = 137;
pub const D3DRS_AMBIENT: u32 = 139;
pub const D3DRS_COLORVERTEX: u32 = 141;
pub const D3DRS_NORMALIZENORMALS: u32 = 143;
pub const D3DRS_DIFFUSEMATERIALSOURCE: u32 = 145;
pub const D3DRS_SPECULARMATERIALSOURCE: u32 = 146;
pub const D3DRS_AMBIENTMATERIALSOURCE: u32 = 147;
pub const D3DRS_EMISSIVEMATERIALSOURCE: u32 = 148;
pub const D3DRS_BLENDOP: u32 = 171;
/// One past the last D3D8 render state (`D3DRS_NORMALORDER`).
pub const D3DRS_MAX: u32 = 174;

// D3DTEXTURESTAGESTATETYPE
pub const D3DTSS_COLOROP: u32 = 1;
pub const D3DTSS_COLORARG1: u32 = 2;
pub const D3DTSS_COLORARG2: u32 = 3;
pub const D3DTSS_ALPHAOP: u32 = 4;
pub const D3DTSS_ALPHAARG1: u32 = 5;
pub const D3DTSS_ALPHAARG2: u32 = 6;
pub const D3DTSS_TEXCOORDINDEX: u32 = 11;
pub const D3DTSS_ADDRESSU: u32 = 13;
pub const D3DTSS_ADDRESSV: u32 = 14;
pub const D3DTSS_MAGFILTER: u32 = 16;
pub const D3DTSS_MINFILTER: u32 = 17;
pub const D3DTSS_MIPFILTER: u32 = 18;
pub const D3DTSS_TEXTURETRANSFORMFLAGS: u32 = 24;
/// One past the last D3D8 texture stage state (`D3DTSS_RESULTARG`).
pub const D3DTSS_MAX: u32 = 29;

// D3DTEXTUREOP
pub const D3DTOP_DISABLE: u32 = 1;
pub const D3DTOP_SELECTARG1: u32 = 2;
pub const D3DTOP_SELECTARG2: u32 = 3;
pub const D3DTOP_MODULATE: u32 = 4;
pub const D3DTOP_MODULATE2X: u32 = 5;
pub const D3DTOP_MODULATE4X: u32 = 6;
pub const D3DTOP_ADD: u32 = 7;
pub const D3DTOP_ADDSIGNED: u32 = 8;
pub const D3DTOP_ADDSIGNED2X: u32 = 9;
pub const D3DTOP_SUBTRACT: u32 = 10;
pub const D3DTOP_ADDSMOOTH: u32 = 11;
pub const D3DTOP_BLENDDIFFUSEALPHA: u32 = 12;
pub const D3DTOP_BLENDTEXTUREALPHA: u32 = 13;
pub const D3DTOP_BLENDFACTORALPHA: u32 = 14;
pub const D3DTOP_BLENDCURRENTALPHA: u32 = 16;
pub const D3DTOP_DOTPRODUCT3: u32 = 24;

// D3DTA_*
pub const D3DTA_DIFFUSE: u32 = 0;
pub const D3DTA_CURRENT: u32 = 1;
pub const D3DTA_TEXTURE: u32 = 2;
pub const D3DTA_TFACTOR: u32 = 3;
pub const D3DTA_SPECULAR: u32 = 4;
pub const D3DTA_COMPLEMENT: u32 = 0x10;
pub const D3DTA_ALPHAREPLICATE: u32 = 0x20;

// D3DTEXTURETRANSFORMFLAGS
pub const D3DTTFF_DISABLE: u32 = 0;

// D3DBLEND
pub const D3DBLEND_ZERO: u32 = 1;
pub const D3DBLEND_ONE: u32 = 2;
pub const D3DBLEND_SRCCOLOR: u32 = 3;
pub const D3DBLEND_INVSRCCOLOR: u32 = 4;
pub const D3DBLEND_SRCALPHA: u32 = 5;
pub const D3DBLEND_INVSRCALPHA: u32 = 6;
pub const D3DBLEND_DESTALPHA: u32 = 7;
pub const D3DBLEND_INVDESTALPHA: u32 = 8;
pub const D3DBLEND_DESTCOLOR: u32 = 9;
pub const D3DBLEND_INVDESTCOLOR: u32 = 10;
pub const D3DBLEND_SRCALPHASAT: u32 = 11;
pub const D3DBLEND_BOTHSRCALPHA: u32 = 12;
pub const D3DBLEND_BOTHINVSRCALPHA: u32 = 13;

// D3DCMPFUNC
pub const D3DCMP_NEVER: u32 = 1;
pub const D3DCMP_LESS: u32 = 2;
pub const D3DCMP_EQUAL: u32 = 3;
pub const D3DCMP_LESSEQUAL: u32 = 4;
pub const D3DCMP_GREATER: u32 = 5;
pub const D3DCMP_NOTEQUAL: u32 = 6;
pub const D3DCMP_GREATEREQUAL: u32 = 7;
pub const D3DCMP_ALWAYS: u32 = 8;

// D3DMATERIALCOLORSOURCE
pub const D3DMCS_MATERIAL: u32 = 0;
pub const D3DMCS_COLOR1: u32 = 1;
pub const D3DMCS_COLOR2: u32 = 2;

// D3DLIGHTTYPE
pub const D3DLIGHT_POINT: u32 = 1;
pub const D3DLIGHT_SPOT: u32 = 2;
pub const D3DLIGHT_DIRECTIONAL: u32 = 3;

// D3DTRANSFORMSTATETYPE
pub const D3DTS_VIEW: u32 = 2;
pub const D3DTS_PROJECTION: u32 = 3;
pub const D3DTS_TEXTURE0: u32 = 16;
pub const D3DTS_TEXTURE7: u32 = 23;
pub const D3DTS_WORLD: u32 = 256;

// D3DPRIMITIVETYPE
pub const D3DPT_POINTLIST: u32 = 1;
pub const D3DPT_LINELIST: u32 = 2;
pub const D3DPT_LINESTRIP: u32 = 3;
pub const D3DPT_TRIANGLELIST: u32 = 4;
pub const D3DPT_TRIANGLESTRIP: u32 = 5;
pub const D3DPT_TRIANGLEFAN: u32 = 6;

// D3DRESOURCETYPE
pub const D3DRTYPE_SURFACE: u32 = 1;
pub const D3DRTYPE_TEXTURE: u32 = 3;
pub const D3DRTYPE_VERTEXBUFFER: u32 = 6;
pub const D3DRTYPE_INDEXBUFFER: u32 = 7;

// D3DPOOL
pub const D3DPOOL_DEFAULT: u32 = 0;
pub const D3DPOOL_MANAGED: u32 = 1;
pub const D3DPOOL_SYSTEMMEM: u32 = 2;

// Render state values used as device defaults
pub const D3DZB_TRUE: u32 = 1;
pub const D3DFILL_SOLID: u32 = 3;
pub const D3DSHADE_GOURAUD: u32 = 2;
pub const D3DCULL_CCW: u32 = 3;
pub const D3DBLENDOP_ADD: u32 = 1;
pub const D3DTADDRESS_WRAP: u32 = 1;
pub const D3DTEXF_POINT: u32 = 1;

// D3DUSAGE
pub const D3DUSAGE_RENDERTARGET: u32 = 0x1;
pub const D3DUSAGE_DEPTHSTENCIL: u32 = 0x2;
pub const D3DUSAGE_WRITEONLY: u32 = 0x8;
pub const D3DUSAGE_DYNAMIC: u32 = 0x200;

// HRESULTs
pub const D3D_OK: u32 = 0;
pub const D3DERR_WRONGTEXTUREFORMAT: u32 = 0x8876_0818;
pub const D3DERR_NOTAVAILABLE: u32 = 0x8876_086A;
pub const D3DERR_DEVICELOST: u32 = 0x8876_0868;
pub const D3DERR_INVALIDCALL: u32 = 0x8876_086C;
