use std::sync::Arc;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use super::op_list::{OpList, RenderTargetOpList, TextureOpList};
use super::{OpListId, ProxyKey};
use crate::errors::{ProxyError, Result};
use crate::provider::{PixelData, TextureProvider};
use crate::proxy::SurfaceProxy;
use crate::settings::ProxySettings;
use crate::surface::{BackingFit, GpuSurface, IRect, SurfaceDesc};

/// Key under which a tight copy of a proxy's content area is cached.
///
/// Keyed by graph handle rather than [`ProxyId`](crate::proxy::ProxyId): two proxies wrapping the
/// same surface share an id but own separate copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyKey {
    pub source: ProxyKey,
    pub area: IRect,
    pub mipped: bool,
}

struct ProxyEntry {
    proxy: SurfaceProxy,
    ref_count: u32,
}

/// Owning registry for one frame graph's proxies and op lists.
///
/// # Ownership
///
/// | Side      | Holds                    | Owned by     |
/// |-----------|--------------------------|--------------|
/// | Proxy     | `Option<OpListId>`       | `ProxyGraph` |
/// | Op list   | `Option<ProxyKey>`       | `ProxyGraph` |
/// | Surface   | `Arc<GpuSurface>`        | shared       |
///
/// Proxies are reference counted by the graph ([`retain`](Self::retain) /
/// [`release`](Self::release)); when the last reference goes, the proxy
/// detaches from its producer synchronously before it is dropped.
///
/// # Thread Safety
///
/// A graph and its proxies are confined to the thread building the frame.
pub struct ProxyGraph {
    settings: ProxySettings,
    proxies: SlotMap<ProxyKey, ProxyEntry>,
    op_lists: SlotMap<OpListId, OpList>,
    copies: FxHashMap<CopyKey, ProxyKey>,
}

impl ProxyGraph {
    #[must_use]
    pub fn new(settings: ProxySettings) -> Self {
        Self {
            settings,
            proxies: SlotMap::with_key(),
            op_lists: SlotMap::with_key(),
            copies: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    // ── Proxy construction ─────────────────────────────────────────────────

    /// Takes ownership of a proxy with a reference count of one.
    pub fn insert(&mut self, proxy: SurfaceProxy) -> ProxyKey {
        self.proxies.insert(ProxyEntry {
            proxy,
            ref_count: 1,
        })
    }

    pub fn make_wrapped(&mut self, surface: Arc<GpuSurface>) -> Result<ProxyKey> {
        let proxy = SurfaceProxy::make_wrapped(surface, &self.settings)?;
        Ok(self.insert(proxy))
    }

    pub fn make_deferred(
        &mut self,
        desc: &SurfaceDesc,
        fit: BackingFit,
        budgeted: bool,
    ) -> Result<ProxyKey> {
        let proxy = SurfaceProxy::make_deferred(desc, fit, budgeted, &self.settings)?;
        Ok(self.insert(proxy))
    }

    pub fn make_deferred_with_data<P>(
        &mut self,
        provider: &mut P,
        desc: &SurfaceDesc,
        budgeted: bool,
        pixels: Option<PixelData<'_>>,
    ) -> Result<ProxyKey>
    where
        P: TextureProvider + ?Sized,
    {
        let proxy =
            SurfaceProxy::make_deferred_with_data(provider, desc, budgeted, pixels, &self.settings)?;
        Ok(self.insert(proxy))
    }

    // ── Proxy access ───────────────────────────────────────────────────────

    #[must_use]
    pub fn proxy(&self, key: ProxyKey) -> Option<&SurfaceProxy> {
        self.proxies.get(key).map(|e| &e.proxy)
    }

    pub fn proxy_mut(&mut self, key: ProxyKey) -> Option<&mut SurfaceProxy> {
        self.proxies.get_mut(key).map(|e| &mut e.proxy)
    }

    #[must_use]
    pub fn contains_proxy(&self, key: ProxyKey) -> bool {
        self.proxies.contains_key(key)
    }

    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    #[must_use]
    pub fn ref_count(&self, key: ProxyKey) -> Option<u32> {
        self.proxies.get(key).map(|e| e.ref_count)
    }

    /// Instantiates the proxy through `provider` (no-op if already backed).
    pub fn instantiate<P>(&mut self, key: ProxyKey, provider: &mut P) -> Result<Arc<GpuSurface>>
    where
        P: TextureProvider + ?Sized,
    {
        self.proxies
            .get_mut(key)
            .ok_or(ProxyError::UnknownProxy)?
            .proxy
            .instantiate(provider)
    }

    /// Sum of the worst-case footprints of all budgeted proxies.
    #[must_use]
    pub fn worst_case_budgeted_bytes(&self) -> u64 {
        self.proxies
            .values()
            .filter(|e| e.proxy.is_budgeted())
            .map(|e| e.proxy.gpu_memory_size())
            .sum()
    }

    // ── Proxy lifetime ─────────────────────────────────────────────────────

    pub fn retain(&mut self, key: ProxyKey) -> Result<()> {
        let entry = self.proxies.get_mut(key).ok_or(ProxyError::UnknownProxy)?;
        entry.ref_count += 1;
        Ok(())
    }

    /// Drops one reference. Returns `true` if that was the last one and the
    /// proxy has been torn down.
    pub fn release(&mut self, key: ProxyKey) -> Result<bool> {
        let entry = self.proxies.get_mut(key).ok_or(ProxyError::UnknownProxy)?;
        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return Ok(false);
        }

        let Some(entry) = self.proxies.remove(key) else {
            return Err(ProxyError::UnknownProxy);
        };
        self.teardown(key, &entry.proxy);
        Ok(true)
    }

    fn teardown(&mut self, key: ProxyKey, proxy: &SurfaceProxy) {
        if let Some(producer) = proxy.last_producer()
            && let Some(list) = self.op_lists.get_mut(producer)
            && list.target() == Some(key)
        {
            list.clear_target();
        }

        // Copies of a dead source can never be looked up again.
        let mut stale: SmallVec<[ProxyKey; 4]> = SmallVec::new();
        self.copies.retain(|k, copy| {
            if k.source == key {
                stale.push(*copy);
                false
            } else {
                *copy != key
            }
        });
        for copy in stale {
            if let Err(e) = self.release(copy) {
                log::warn!("ProxyGraph: releasing cached copy {copy:?} failed: {e}");
            }
        }

        log::debug!("ProxyGraph: released proxy {:?} ('{}')", proxy.id(), proxy.desc().label);
    }

    // ── Op lists ───────────────────────────────────────────────────────────

    /// Opens a render pass writing `target` and registers it as the target's
    /// last producer.
    pub fn add_render_target_op_list(
        &mut self,
        label: &'static str,
        target: ProxyKey,
    ) -> Result<OpListId> {
        let id = self
            .op_lists
            .insert_with_key(|id| OpList::new_render_target(id, label));
        self.register_new_producer(target, id)
    }

    /// Opens an upload/copy op list writing `target` and registers it as the
    /// target's last producer.
    pub fn add_texture_op_list(&mut self, label: &'static str, target: ProxyKey) -> Result<OpListId> {
        let id = self
            .op_lists
            .insert_with_key(|id| OpList::new_texture(id, label));
        self.register_new_producer(target, id)
    }

    fn register_new_producer(&mut self, target: ProxyKey, id: OpListId) -> Result<OpListId> {
        if let Err(e) = self.set_last_producer(target, id) {
            self.op_lists.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    #[must_use]
    pub fn op_list(&self, id: OpListId) -> Option<&OpList> {
        self.op_lists.get(id)
    }

    pub fn op_list_mut(&mut self, id: OpListId) -> Option<&mut OpList> {
        self.op_lists.get_mut(id)
    }

    #[must_use]
    pub fn op_list_count(&self) -> usize {
        self.op_lists.len()
    }

    pub fn close_op_list(&mut self, id: OpListId) -> Result<()> {
        self.op_lists
            .get_mut(id)
            .ok_or(ProxyError::UnknownOpList)?
            .make_closed();
        Ok(())
    }

    /// Destroys an op list, detaching any proxy that still names it as its
    /// last producer.
    pub fn remove_op_list(&mut self, id: OpListId) -> Result<OpList> {
        let list = self.op_lists.remove(id).ok_or(ProxyError::UnknownOpList)?;
        if let Some(target) = list.target()
            && let Some(entry) = self.proxies.get_mut(target)
            && entry.proxy.last_producer() == Some(id)
        {
            entry.proxy.replace_last_producer(None);
            log::debug!(
                "ProxyGraph: op list '{}' removed, detached from proxy {:?}",
                list.label(),
                entry.proxy.id()
            );
        }
        Ok(list)
    }

    // ── Producer tracking ──────────────────────────────────────────────────

    /// Makes `op_list` the proxy's last producer.
    ///
    /// Under strict validation the previous producer must already be closed;
    /// otherwise two passes would both claim to be the authoritative last
    /// writer. The replaced producer's target is cleared either way.
    pub fn set_last_producer(&mut self, proxy: ProxyKey, op_list: OpListId) -> Result<()> {
        let entry = self.proxies.get(proxy).ok_or(ProxyError::UnknownProxy)?;
        let list = self.op_lists.get(op_list).ok_or(ProxyError::UnknownOpList)?;
        let proxy_id = entry.proxy.id();
        let kind = entry.proxy.kind();

        match list {
            OpList::RenderTarget(_) if !kind.is_render_target() => {
                return Err(ProxyError::capability_mismatch(format!(
                    "render pass '{}' cannot write {kind:?} proxy {proxy_id:?}",
                    list.label()
                )));
            }
            OpList::Texture(_) if !kind.is_texture() => {
                return Err(ProxyError::capability_mismatch(format!(
                    "texture op list '{}' cannot write {kind:?} proxy {proxy_id:?}",
                    list.label()
                )));
            }
            _ => {}
        }

        let previous = entry.proxy.last_producer().filter(|&p| p != op_list);
        if entry.proxy.validation().is_strict()
            && let Some(prev) = previous
            && let Some(prev_list) = self.op_lists.get(prev)
            && !prev_list.is_closed()
        {
            return Err(ProxyError::ProducerStillOpen {
                proxy: proxy_id,
                previous: prev,
            });
        }
        let old_target = list.target().filter(|&t| t != proxy);

        // Commit.
        if let Some(prev) = previous
            && let Some(prev_list) = self.op_lists.get_mut(prev)
            && prev_list.target() == Some(proxy)
        {
            prev_list.clear_target();
        }
        if let Some(other) = old_target
            && let Some(other_entry) = self.proxies.get_mut(other)
            && other_entry.proxy.last_producer() == Some(op_list)
        {
            other_entry.proxy.replace_last_producer(None);
        }
        if let Some(entry) = self.proxies.get_mut(proxy) {
            entry.proxy.replace_last_producer(Some(op_list));
        }
        if let Some(list) = self.op_lists.get_mut(op_list) {
            list.set_target(proxy);
        }

        log::debug!("ProxyGraph: proxy {proxy_id:?} last producer -> {op_list:?} (was {previous:?})");
        Ok(())
    }

    /// The proxy's last producer, if it is a render pass.
    #[must_use]
    pub fn last_render_producer(&self, proxy: ProxyKey) -> Option<&RenderTargetOpList> {
        let producer = self.proxies.get(proxy)?.proxy.last_producer()?;
        self.op_lists.get(producer)?.as_render_target_op_list()
    }

    /// The proxy's last producer, if it is a texture upload/copy op list.
    #[must_use]
    pub fn last_texture_producer(&self, proxy: ProxyKey) -> Option<&TextureOpList> {
        let producer = self.proxies.get(proxy)?.proxy.last_producer()?;
        self.op_lists.get(producer)?.as_texture_op_list()
    }

    // ── Copy cache ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn cached_copy(&self, key: &CopyKey) -> Option<ProxyKey> {
        self.copies.get(key).copied()
    }

    /// Caches `copy` under `key`, holding a reference to it.
    pub fn cache_copy(&mut self, key: CopyKey, copy: ProxyKey) -> Result<()> {
        self.retain(copy)?;
        if let Some(old) = self.copies.insert(key, copy) {
            self.release(old)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn copy_count(&self) -> usize {
        self.copies.len()
    }

    // ── Validation ─────────────────────────────────────────────────────────

    /// Cross-checks every proxy ↔ op-list association and every backing extent.
    pub fn validate(&self) -> Result<()> {
        for (key, entry) in &self.proxies {
            let proxy = &entry.proxy;
            if let Some(producer) = proxy.last_producer() {
                let list = self.op_lists.get(producer).ok_or_else(|| {
                    ProxyError::Validation(format!(
                        "proxy {:?} names missing producer {producer:?}",
                        proxy.id()
                    ))
                })?;
                if list.target() != Some(key) {
                    return Err(ProxyError::Validation(format!(
                        "producer '{}' of proxy {:?} targets {:?}",
                        list.label(),
                        proxy.id(),
                        list.target()
                    )));
                }
            }
            if let Some((w, h)) = proxy.backing_extent()
                && (w < proxy.desc().width || h < proxy.desc().height)
            {
                return Err(ProxyError::Validation(format!(
                    "proxy {:?} backed by {w}x{h}, smaller than {}x{}",
                    proxy.id(),
                    proxy.desc().width,
                    proxy.desc().height
                )));
            }
        }

        for (id, list) in &self.op_lists {
            if let Some(target) = list.target() {
                let entry = self.proxies.get(target).ok_or_else(|| {
                    ProxyError::Validation(format!("op list '{}' targets a dead proxy", list.label()))
                })?;
                if entry.proxy.last_producer() != Some(id) {
                    return Err(ProxyError::Validation(format!(
                        "op list '{}' targets proxy {:?} which does not name it as producer",
                        list.label(),
                        entry.proxy.id()
                    )));
                }
            }
        }

        for (key, copy) in &self.copies {
            if !self.proxies.contains_key(*copy) {
                return Err(ProxyError::Validation(format!(
                    "cached copy of {:?} is dead",
                    key.source
                )));
            }
        }
        Ok(())
    }
}

impl Default for ProxyGraph {
    fn default() -> Self {
        Self::new(ProxySettings::default())
    }
}
