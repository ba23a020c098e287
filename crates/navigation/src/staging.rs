use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use scene::{HotspotRef, HotspotVisual, MaskLayer, SceneSlot, project};
use streaming::{LoadFuture, ResourceCache, ResourceHandle, ResourceLoadError};
use tour::{HotspotSource, PanoramaNode};
use tracing::warn;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StagingOptions {
    pub mask_overlay: bool,
}

/// Acquire every resource `node` references and build its scene slot.
///
/// Only a panorama failure fails the slot. A hotspot whose icon failed is
/// left out; a failed mask leaves the node without navigable regions.
pub fn acquire_slot(
    node: &PanoramaNode,
    cache: &ResourceCache,
    opts: StagingOptions,
) -> BoxFuture<'static, Result<SceneSlot, ResourceLoadError>> {
    let node = node.clone();
    let panorama = cache.load(&node.image);
    let extras: Vec<_> = node
        .hotspots
        .resource_urls()
        .into_iter()
        .map(|url| {
            let url = url.to_string();
            cache.load(&url).map(move |result| (url, result)).boxed()
        })
        .collect();

    build_slot(node, panorama, extras, opts).boxed()
}

async fn build_slot(
    node: PanoramaNode,
    panorama: LoadFuture,
    extras: Vec<BoxFuture<'static, (String, Result<ResourceHandle, ResourceLoadError>)>>,
    opts: StagingOptions,
) -> Result<SceneSlot, ResourceLoadError> {
    let (panorama, extras) = future::join(panorama, future::join_all(extras)).await;
    let extras: BTreeMap<String, Result<ResourceHandle, ResourceLoadError>> =
        extras.into_iter().collect();

    let mut slot = SceneSlot::new(node.id.clone(), panorama?);
    match &node.hotspots {
        HotspotSource::Geometric(hotspots) => {
            for h in hotspots {
                let icon = match h.icon.as_deref().map(|url| extras.get(url)) {
                    None => None,
                    Some(Some(Ok(handle))) => Some(handle.clone()),
                    Some(Some(Err(err))) => {
                        warn!(node = %node.id, hotspot = %h.id, error = %err, "skipping hotspot");
                        continue;
                    }
                    Some(None) => continue,
                };
                slot.push_hotspot(HotspotVisual {
                    hotspot: HotspotRef {
                        key: h.id.clone(),
                        target: h.target.clone(),
                        label: h.label.clone(),
                    },
                    placement: project(h),
                    icon,
                });
            }
        }
        HotspotSource::Mask(mask) => match extras.get(&mask.image) {
            Some(Ok(image)) => {
                let overlay = opts
                    .mask_overlay
                    .then(|| Arc::new(scene::mask::overlay_tint(image)));
                slot.set_mask(MaskLayer {
                    image: image.clone(),
                    regions: mask.regions.clone(),
                    overlay,
                });
            }
            Some(Err(err)) => {
                warn!(node = %node.id, error = %err, "mask unavailable; node is not interactive");
            }
            None => {}
        },
    }
    Ok(slot)
}
