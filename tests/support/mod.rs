#![allow(dead_code)]

use paperdoll::{
    Affine, Canvas, Landmark, LandmarkId, LandmarkSet, PaperdollResult, Point, RenderSurface,
    Rgba8, VectorAsset, VectorAssetSet,
};

pub fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "paperdoll_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

pub fn svg(w: u32, h: u32) -> String {
    format!(r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"></svg>"#)
}

pub fn filled_svg(w: u32, h: u32, fill: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"><rect width="{w}" height="{h}" fill="{fill}"/></svg>"#
    )
}

pub fn assets(entries: &[(&str, String)]) -> VectorAssetSet {
    let mut set = VectorAssetSet::new();
    for (part, source) in entries {
        set.insert(*part, source.clone());
    }
    set
}

pub fn pose(points: &[(LandmarkId, f64, f64, f64)]) -> LandmarkSet {
    points
        .iter()
        .fold(LandmarkSet::empty(), |set, &(id, x, y, c)| {
            set.with(id, Landmark::new(x, y, c))
        })
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear,
    Line(Point, Point),
    Circle(Point, f64),
    Asset { content_id: u64, transform: Affine },
}

/// Surface double that records draw calls instead of rasterizing.
pub struct RecordingSurface {
    pub size: Canvas,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Canvas { width, height },
            calls: Vec::new(),
        }
    }

    pub fn asset_draws(&self) -> Vec<(u64, Affine)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Asset {
                    content_id,
                    transform,
                } => Some((*content_id, *transform)),
                _ => None,
            })
            .collect()
    }

    pub fn take(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> Canvas {
        self.size
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn stroke_line(&mut self, from: Point, to: Point, _: Rgba8, _: f64) -> PaperdollResult<()> {
        self.calls.push(DrawCall::Line(from, to));
        Ok(())
    }

    fn fill_circle(&mut self, center: Point, radius: f64, _: Rgba8) -> PaperdollResult<()> {
        self.calls.push(DrawCall::Circle(center, radius));
        Ok(())
    }

    fn draw_asset(&mut self, asset: &VectorAsset, transform: Affine) -> PaperdollResult<()> {
        self.calls.push(DrawCall::Asset {
            content_id: asset.content_id(),
            transform,
        });
        Ok(())
    }
}

pub fn approx(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
}
