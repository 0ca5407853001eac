//! Reuse of released plane textures.
//!
//! Slots are torn down and rebuilt whenever the stream size or the OSD
//! width changes. Released textures are parked here keyed by
//! (width, height, format) and handed out again before new ones are made.

use crate::texture::GpuTexture;
use std::collections::HashMap;

/// Key for pooled textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

/// Something the pool can hold.
pub trait Poolable {
    fn pool_key(&self) -> PoolKey;
    fn memory_size(&self) -> usize;
}

impl Poolable for GpuTexture {
    fn pool_key(&self) -> PoolKey {
        PoolKey {
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    fn memory_size(&self) -> usize {
        GpuTexture::memory_size(self)
    }
}

/// Free list of textures under a memory budget.
pub struct TexturePool<T = GpuTexture> {
    free: HashMap<PoolKey, Vec<T>>,
    pooled_memory: usize,
    max_memory: usize,
    hits: u64,
    misses: u64,
}

impl<T: Poolable> TexturePool<T> {
    pub fn new(max_memory: usize) -> Self {
        Self {
            free: HashMap::new(),
            pooled_memory: 0,
            max_memory,
            hits: 0,
            misses: 0,
        }
    }

    /// Take a parked texture matching `key`.
    pub fn take(&mut self, key: PoolKey) -> Option<T> {
        let texture = self.free.get_mut(&key).and_then(Vec::pop);
        match &texture {
            Some(t) => {
                self.pooled_memory -= t.memory_size();
                self.hits += 1;
            }
            None => self.misses += 1,
        }
        texture
    }

    /// Park a texture. Returns false when it was dropped to stay in budget.
    pub fn put(&mut self, texture: T) -> bool {
        let size = texture.memory_size();
        if self.pooled_memory + size > self.max_memory {
            return false;
        }
        self.pooled_memory += size;
        self.free.entry(texture.pool_key()).or_default().push(texture);
        true
    }

    pub fn memory_usage(&self) -> usize {
        self.pooled_memory
    }

    pub fn texture_count(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// (hits, misses) of `take`.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.free.clear();
        self.pooled_memory = 0;
    }

    /// Drop parked textures, largest groups first, until at or below
    /// `target_memory`.
    pub fn evict_to(&mut self, target_memory: usize) {
        while self.pooled_memory > target_memory {
            let Some(key) = self
                .free
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .max_by_key(|(_, v)| v.len())
                .map(|(k, _)| *k)
            else {
                break;
            };
            if let Some(textures) = self.free.get_mut(&key) {
                if let Some(t) = textures.pop() {
                    self.pooled_memory -= t.memory_size();
                }
                if textures.is_empty() {
                    self.free.remove(&key);
                }
            }
        }
    }
}
