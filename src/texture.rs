// texture.rs — 纹理加载与 GPU 上传 (颜色贴图 / 法线贴图)

use crate::error::TextureError;
use image::io::Reader as ImageReader;
use image::RgbaImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// sRGB color data.
    Color,
    /// Linear tangent-space normals.
    NormalMap,
}

impl TextureKind {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureKind::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureKind::NormalMap => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    /// Texel used when no file could be loaded.
    pub fn fallback_texel(self) -> [u8; 4] {
        match self {
            TextureKind::Color => [255, 255, 255, 255],
            TextureKind::NormalMap => [128, 128, 255, 255],
        }
    }
}

pub fn load_rgba(path: &Path) -> Result<RgbaImage, TextureError> {
    let file = File::open(path).map_err(|source| TextureError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map(|img| img.to_rgba8())
        .map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Scales `img` down so neither side exceeds `max_dimension`.
pub fn fit_to_limit(img: RgbaImage, max_dimension: u32) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    if src_w <= max_dimension && src_h <= max_dimension {
        return img;
    }

    let scale = (max_dimension as f32 / src_w.max(src_h) as f32).min(1.0);
    let new_w = ((src_w as f32 * scale) as u32).clamp(1, max_dimension);
    let new_h = ((src_h as f32 * scale) as u32).clamp(1, max_dimension);
    log::warn!(
        "texture {src_w}x{src_h} exceeds GPU limit {max_dimension}, scaled to {new_w}x{new_h}"
    );
    image::DynamicImage::ImageRgba8(img)
        .resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3)
        .to_rgba8()
}

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        kind: TextureKind,
        label: &str,
    ) -> Self {
        let (width, height) = img.dimensions();
        let texture_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label: Some(label),
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            texture_size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, kind: TextureKind, label: &str) -> Self {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba(kind.fallback_texel()));
        Self::from_image(device, queue, &img, kind, label)
    }

    /// Loads `path`, falling back to a 1×1 texel when it is missing or
    /// unreadable.
    pub fn load_or_solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        kind: TextureKind,
    ) -> Self {
        let label = path.display().to_string();
        match load_rgba(path) {
            Ok(img) => {
                let img = fit_to_limit(img, device.limits().max_texture_dimension_2d);
                log::info!(
                    "loaded {:?} texture {} ({}x{})",
                    kind,
                    label,
                    img.width(),
                    img.height()
                );
                Self::from_image(device, queue, &img, kind, &label)
            }
            Err(e) => {
                log::warn!("{e}; using a flat {kind:?} texture");
                Self::solid(device, queue, kind, &label)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_rgba(Path::new("no/such/texture.png")).unwrap_err();
        assert!(matches!(err, TextureError::Open { .. }));
    }

    #[test]
    fn test_fit_to_limit_keeps_small_images() {
        let img = RgbaImage::new(64, 32);
        let out = fit_to_limit(img, 128);
        assert_eq!(out.dimensions(), (64, 32));
    }

    #[test]
    fn test_fit_to_limit_scales_down() {
        let img = RgbaImage::new(400, 200);
        let out = fit_to_limit(img, 100);
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn test_flat_normal_texel_points_out() {
        let [x, y, z, _] = TextureKind::NormalMap.fallback_texel();
        let n = |c: u8| c as f32 / 255.0 * 2.0 - 1.0;
        assert!(n(x).abs() < 0.01 && n(y).abs() < 0.01);
        assert!(n(z) > 0.99);
    }
}
