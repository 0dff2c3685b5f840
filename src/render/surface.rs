use resvg::tiny_skia;

use crate::assets::decode::VectorAsset;
use crate::foundation::core::{Affine, Canvas, Point, Rgba8};
use crate::foundation::error::{PaperdollError, PaperdollResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Readback of a rendered surface.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Convert to straight alpha (what PNG encoders expect).
    pub fn into_straight_alpha(mut self) -> Self {
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut self.data);
            self.premultiplied = false;
        }
        self
    }
}

/// 2D pixel target the compositor draws into.
///
/// Every draw call carries its full transform, so no transform state survives between calls
/// and nothing needs to be saved or restored around a part.
pub trait RenderSurface {
    fn size(&self) -> Canvas;

    fn clear(&mut self);

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba8, width: f64)
    -> PaperdollResult<()>;

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) -> PaperdollResult<()>;

    /// Rasterize `asset` with its intrinsic coordinate space mapped through `transform`.
    fn draw_asset(&mut self, asset: &VectorAsset, transform: Affine) -> PaperdollResult<()>;
}

/// CPU surface backed by a premultiplied RGBA8 `tiny_skia` pixmap.
pub struct PixmapSurface {
    canvas: Canvas,
    pixmap: tiny_skia::Pixmap,
    clear_rgba: Option<Rgba8>,
}

impl PixmapSurface {
    pub fn new(canvas: Canvas) -> PaperdollResult<Self> {
        let pixmap = tiny_skia::Pixmap::new(canvas.width, canvas.height).ok_or_else(|| {
            PaperdollError::render(format!(
                "failed to allocate {}x{} surface",
                canvas.width, canvas.height
            ))
        })?;
        Ok(Self {
            canvas,
            pixmap,
            clear_rgba: None,
        })
    }

    /// Background used by [`RenderSurface::clear`]; transparent when unset.
    pub fn with_clear_color(mut self, color: Option<Rgba8>) -> Self {
        self.clear_rgba = color;
        self
    }

    pub fn readback(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data().to_vec(),
            premultiplied: true,
        }
    }
}

impl RenderSurface for PixmapSurface {
    fn size(&self) -> Canvas {
        self.canvas
    }

    fn clear(&mut self) {
        let color = match self.clear_rgba {
            Some(c) => tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a),
            None => tiny_skia::Color::TRANSPARENT,
        };
        self.pixmap.fill(color);
    }

    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        color: Rgba8,
        width: f64,
    ) -> PaperdollResult<()> {
        let mut pb = tiny_skia::PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let path = pb
            .finish()
            .ok_or_else(|| PaperdollError::render("degenerate line path"))?;

        let stroke = tiny_skia::Stroke {
            width: width as f32,
            ..tiny_skia::Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint(color),
            &stroke,
            tiny_skia::Transform::identity(),
            None,
        );
        Ok(())
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) -> PaperdollResult<()> {
        let path = tiny_skia::PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32)
            .ok_or_else(|| PaperdollError::render(format!("invalid circle radius {radius}")))?;
        self.pixmap.fill_path(
            &path,
            &paint(color),
            tiny_skia::FillRule::Winding,
            tiny_skia::Transform::identity(),
            None,
        );
        Ok(())
    }

    fn draw_asset(&mut self, asset: &VectorAsset, transform: Affine) -> PaperdollResult<()> {
        if !transform.is_finite() {
            return Err(PaperdollError::render("non-finite asset transform"));
        }
        // Zero-scale placements are legal but cover no pixels.
        if transform.determinant().abs() < f64::EPSILON {
            return Ok(());
        }
        resvg::render(asset.tree(), affine_to_skia(transform), &mut self.pixmap.as_mut());
        Ok(())
    }
}

fn paint(color: Rgba8) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn affine_to_skia(m: Affine) -> tiny_skia::Transform {
    let [a, b, c, d, e, f] = m.as_coeffs();
    tiny_skia::Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
