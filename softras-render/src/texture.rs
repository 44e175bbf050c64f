// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! 2D texture object.
//!
//! Textures back both framebuffer attachments and user imagery. The
//! pipeline itself never samples them (fragment shaders may, through
//! their own code); it only fills attachments on clear and reads/writes
//! pixels in the fragment output stage. Depth planes are ordinary
//! rgba-sized textures whose 4-byte pixels are interpreted as one f32.

use glam::UVec2;
use softras_common::{Color, RenderError, Result};

/// Internal texel layout, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TexFormat {
    /// Unspecified; deduced from the data format at construction.
    #[default]
    Undefined,
    /// Single channel.
    R,
    /// Three color channels.
    Rgb,
    /// Four color channels.
    Rgba,
}

impl TexFormat {
    /// Channel count, and therefore bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            TexFormat::Undefined => 0,
            TexFormat::R => 1,
            TexFormat::Rgb => 3,
            TexFormat::Rgba => 4,
        }
    }
}

/// Scaling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Linear,
    Nearest,
}

/// Out-of-bounds addressing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    MirrorRepeat,
    ClampToEdge,
}

/// Construction parameters. The defaults mirror a freshly created
/// sampler: deduced format, linear magnification, nearest minification,
/// repeat wrapping on both axes.
#[derive(Debug, Clone, Copy)]
pub struct TextureSpec {
    pub internal_format: TexFormat,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

impl Default for TextureSpec {
    fn default() -> Self {
        Self {
            internal_format: TexFormat::Undefined,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Nearest,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
        }
    }
}

/// Owned 2D image, row-major, y ascending.
#[derive(Debug, Clone)]
pub struct Texture {
    data: Vec<u8>,
    size: UVec2,
    format: TexFormat,
    mag_filter: FilterMode,
    min_filter: FilterMode,
    wrap_s: WrapMode,
    wrap_t: WrapMode,
}

impl Texture {
    /// Create a texture from optional pixel data.
    ///
    /// Without data the payload is zero-initialized. Converting supplied
    /// data between formats is not implemented: `data_format` must match
    /// the resolved internal format when `data` is present.
    pub fn new(
        data: Option<Vec<u8>>,
        size: UVec2,
        data_format: TexFormat,
        spec: TextureSpec,
    ) -> Result<Self> {
        debug_assert!(data_format != TexFormat::Undefined, "data format must be defined");
        debug_assert!(size.x != 0 && size.y != 0, "texture size must be non-zero");

        let format = if spec.internal_format == TexFormat::Undefined {
            data_format
        } else {
            spec.internal_format
        };

        let byte_len = (size.x * size.y) as usize * format.channels();
        let data = match data {
            Some(bytes) => {
                if data_format != format {
                    return Err(RenderError::NotImplemented("texture format conversion"));
                }
                debug_assert!(
                    bytes.len() == byte_len,
                    "texture data length {} does not match {}x{} {:?}",
                    bytes.len(),
                    size.x,
                    size.y,
                    format
                );
                bytes
            }
            None => vec![0u8; byte_len],
        };

        Ok(Self {
            data,
            size,
            format,
            mag_filter: spec.mag_filter,
            min_filter: spec.min_filter,
            wrap_s: spec.wrap_s,
            wrap_t: spec.wrap_t,
        })
    }

    /// Zero-initialized texture, the framebuffer attachment shorthand.
    pub fn blank(size: UVec2, format: TexFormat) -> Self {
        Self {
            data: vec![0u8; (size.x * size.y) as usize * format.channels()],
            size,
            format,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Nearest,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
        }
    }

    /// Fill every pixel with `color`, truncated to 8 bits per channel.
    /// Single-channel textures take the red channel in every byte.
    pub fn fill(&mut self, color: Color) {
        let channels = self.format.channels();
        let bytes = [
            (color.x * 255.0) as u8,
            (color.y * 255.0) as u8,
            (color.z * 255.0) as u8,
            (color.w * 255.0) as u8,
        ];

        if channels == 1 {
            self.data.fill(bytes[0]);
            return;
        }
        for pixel in self.data.chunks_exact_mut(channels) {
            pixel.copy_from_slice(&bytes[..channels]);
        }
    }

    /// Fill every 4-byte group with the bit pattern of `value`.
    /// This is how depth planes are cleared.
    pub fn fill_depth(&mut self, value: f32) {
        let bits = value.to_ne_bytes();
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&bits);
        }
    }

    /// Byte offset of pixel (x, y), or `None` out of bounds.
    pub fn pixel_offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.size.x || y >= self.size.y {
            return None;
        }
        Some((y * self.size.x + x) as usize * self.format.channels())
    }

    /// Channel bytes of pixel (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        let off = self.pixel_offset(x, y)?;
        Some(&self.data[off..off + self.format.channels()])
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut [u8]> {
        let off = self.pixel_offset(x, y)?;
        let channels = self.format.channels();
        Some(&mut self.data[off..off + channels])
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn format(&self) -> TexFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn set_mag_filter(&mut self, mode: FilterMode) {
        self.mag_filter = mode;
    }

    pub fn set_min_filter(&mut self, mode: FilterMode) {
        self.min_filter = mode;
    }

    pub fn set_wrap_s(&mut self, mode: WrapMode) {
        self.wrap_s = mode;
    }

    pub fn set_wrap_t(&mut self, mode: WrapMode) {
        self.wrap_t = mode;
    }

    pub fn mag_filter(&self) -> FilterMode {
        self.mag_filter
    }

    pub fn min_filter(&self) -> FilterMode {
        self.min_filter
    }

    pub fn wrap_s(&self) -> WrapMode {
        self.wrap_s
    }

    pub fn wrap_t(&self) -> WrapMode {
        self.wrap_t
    }
}
