use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gateway::{Gateway, ImageMeta};
use crate::pixels::{Plane, PlaneCoord};

/// Shift applied to one source channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOffset {
    /// 0-based source channel.
    pub index: usize,
    pub x: i64,
    pub y: i64,
    /// In z-sections; positive moves content towards higher z.
    pub z: i64,
}

/// Offsets that refer to a channel the image actually has, in configuration
/// order.
pub fn effective_offsets(offsets: &[ChannelOffset], size_c: usize) -> Vec<ChannelOffset> {
    offsets
        .iter()
        .filter(|o| o.index < size_c)
        .copied()
        .collect()
}

/// Why a zero plane stands in for a source plane.
#[derive(Clone, Debug, PartialEq)]
pub enum ZeroFillReason {
    /// Shifted z falls outside the source stack.
    OutOfRange,
    /// The gateway could not deliver the plane.
    FetchFailed(String),
}

/// Outcome of reading one source plane.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaneFetch {
    Found(Plane),
    ZeroFill(ZeroFillReason),
}

impl PlaneFetch {
    /// The fetched plane, or zeros in the image's shape and pixel type.
    pub fn into_plane(self, image: &ImageMeta) -> Plane {
        match self {
            Self::Found(plane) => plane,
            Self::ZeroFill(_) => Plane::zeros(
                image.pixel_type,
                image.size_y as usize,
                image.size_x as usize,
            ),
        }
    }
}

/// Read the plane at a possibly out-of-range `z`.
pub fn fetch_plane<G: Gateway + ?Sized>(
    gateway: &G,
    image: &ImageMeta,
    z: i64,
    c: usize,
    t: usize,
) -> PlaneFetch {
    if z < 0 || z >= image.size_z as i64 {
        return PlaneFetch::ZeroFill(ZeroFillReason::OutOfRange);
    }
    match gateway.plane(image.id, PlaneCoord::new(z as usize, c, t)) {
        Ok(plane) => PlaneFetch::Found(plane),
        Err(e) => PlaneFetch::ZeroFill(ZeroFillReason::FetchFailed(e.to_string())),
    }
}

/// Lazy sequence of offset planes for a new image.
///
/// Planes come out z-major, then channel in configuration order, then t,
/// which is the order image creation consumes them. Each call to `next`
/// fetches one source plane; the sequence cannot be restarted.
pub struct OffsetPlanes<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
    image: &'a ImageMeta,
    offsets: Vec<ChannelOffset>,
    next: usize,
}

impl<'a, G: Gateway + ?Sized> OffsetPlanes<'a, G> {
    /// `offsets` must already be filtered to the image's channels.
    pub fn new(gateway: &'a G, image: &'a ImageMeta, offsets: Vec<ChannelOffset>) -> Self {
        Self {
            gateway,
            image,
            offsets,
            next: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.image.size_z * self.offsets.len() * self.image.size_t
    }
}

impl<G: Gateway + ?Sized> Iterator for OffsetPlanes<'_, G> {
    type Item = Plane;

    fn next(&mut self) -> Option<Plane> {
        if self.next >= self.total() {
            return None;
        }
        let size_t = self.image.size_t;
        let channels = self.offsets.len();
        let index = self.next;
        self.next += 1;

        let z = index / (channels * size_t);
        let offset = self.offsets[(index / size_t) % channels];
        let t = index % size_t;
        let fetched = match (z as i64).checked_sub(offset.z) {
            Some(source_z) => fetch_plane(self.gateway, self.image, source_z, offset.index, t),
            None => PlaneFetch::ZeroFill(ZeroFillReason::OutOfRange),
        };
        match &fetched {
            PlaneFetch::Found(_) => debug!(
                z,
                shift_z = offset.z,
                c = offset.index,
                t,
                x = offset.x,
                y = offset.y,
                "Offsetting plane"
            ),
            PlaneFetch::ZeroFill(reason) => debug!(
                z,
                shift_z = offset.z,
                c = offset.index,
                t,
                reason = ?reason,
                "Zero plane"
            ),
        }
        Some(fetched.into_plane(self.image).offset(offset.x, offset.y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}
