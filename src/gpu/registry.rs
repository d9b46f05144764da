//! Named GPU buffer registry
//!
//! Central store for the storage buffers shared between compute dispatch and
//! rendering. Buffers are created, written, cleared, and bound by string key.
//!
//! The registry is an explicitly owned value passed to whoever needs it; its
//! lifetime is tied to the scene that created it. Element counts are fixed at
//! creation; there is no implicit resize.

use std::collections::HashMap;

use bytemuck::Pod;

/// Errors raised by [`BufferRegistry`] operations.
///
/// `DuplicateKey` and `InvalidSize` are setup-time configuration errors and
/// should abort initialization. `NotFound` indicates a programmer error (a
/// lookup for a key that was never created) and is not recoverable at runtime.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("buffer key '{0}' already exists in the registry")]
    DuplicateKey(String),

    #[error("buffer '{0}' not found in the registry")]
    NotFound(String),

    #[error("buffer '{0}' must have a non-zero element count")]
    InvalidSize(String),

    #[error("write of {got} elements into buffer '{key}' holding {expected} elements")]
    SizeMismatch {
        key: String,
        got: usize,
        expected: usize,
    },

    #[error("binding slot {slot} is already assigned to buffer '{key}'")]
    SlotInUse { slot: u32, key: String },
}

/// A GPU buffer registered under a string key.
///
/// Owns the `wgpu::Buffer`; element count and element size are recorded at
/// creation so writes can be size-checked.
pub struct NamedBuffer {
    buffer: wgpu::Buffer,
    element_count: usize,
    element_size: usize,
    type_name: &'static str,
}

impl NamedBuffer {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Total size in bytes.
    pub fn byte_size(&self) -> u64 {
        (self.element_count * self.element_size) as u64
    }

    /// Name of the element type the buffer was created with, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Process-wide store of named GPU buffers plus the transient binding-slot
/// assignments for the current dispatch.
///
/// All operations are synchronous from the caller's perspective: writes go
/// through `queue.write_buffer` and become visible to subsequently submitted
/// GPU work in submission order.
pub struct BufferRegistry {
    buffers: HashMap<String, NamedBuffer>,
    /// Slot -> key assignments made since the last `reset_bindings`.
    bindings: Vec<(u32, String)>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
            bindings: Vec::new(),
        }
    }

    /// Allocate a GPU buffer of `count` elements of `T` under `key`.
    ///
    /// The buffer gets `STORAGE | VERTEX | COPY_DST | COPY_SRC` usage so it
    /// can serve as a compute storage buffer, an instance vertex source, and
    /// a clear/readback target.
    pub fn create_buffer<T: Pod>(
        &mut self,
        device: &wgpu::Device,
        key: &str,
        count: usize,
    ) -> Result<(), RegistryError> {
        if self.buffers.contains_key(key) {
            return Err(RegistryError::DuplicateKey(key.to_string()));
        }
        if count == 0 {
            return Err(RegistryError::InvalidSize(key.to_string()));
        }

        let element_size = std::mem::size_of::<T>();
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(key),
            size: (count * element_size) as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        log::debug!(
            "registry: created buffer '{}' ({} x {} = {} bytes)",
            key,
            count,
            element_size,
            count * element_size
        );

        self.buffers.insert(
            key.to_string(),
            NamedBuffer {
                buffer,
                element_count: count,
                element_size,
                type_name: std::any::type_name::<T>(),
            },
        );
        Ok(())
    }

    /// Upload a CPU-side slice into the named buffer.
    ///
    /// The slice length must match the element count the buffer was created
    /// with; partial writes are not part of the contract.
    pub fn write_buffer<T: Pod>(
        &self,
        queue: &wgpu::Queue,
        key: &str,
        data: &[T],
    ) -> Result<(), RegistryError> {
        let named = self.get_buffer(key)?;
        if data.len() != named.element_count {
            return Err(RegistryError::SizeMismatch {
                key: key.to_string(),
                got: data.len(),
                expected: named.element_count,
            });
        }
        queue.write_buffer(&named.buffer, 0, bytemuck::cast_slice(data));
        Ok(())
    }

    /// Zero-fill the named buffer in place.
    pub fn clear_buffer(&self, queue: &wgpu::Queue, key: &str) -> Result<(), RegistryError> {
        let named = self.get_buffer(key)?;
        let zeros = vec![0u8; named.byte_size() as usize];
        queue.write_buffer(&named.buffer, 0, &zeros);
        Ok(())
    }

    pub fn get_buffer(&self, key: &str) -> Result<&NamedBuffer, RegistryError> {
        self.buffers
            .get(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    /// Destroy the named buffer, releasing its GPU memory once all queued
    /// work referencing it completes. Any binding-slot assignment still
    /// pointing at the key is dropped with it.
    pub fn remove_buffer(&mut self, key: &str) -> Result<(), RegistryError> {
        match self.buffers.remove(key) {
            Some(_) => {
                purge_bindings(&mut self.bindings, key);
                Ok(())
            }
            None => Err(RegistryError::NotFound(key.to_string())),
        }
    }

    /// Clear the transient binding-slot assignments made for the current
    /// dispatch. Buffer storage is untouched. Called once per physics step
    /// before rebinding.
    pub fn reset_bindings(&mut self) {
        self.bindings.clear();
    }

    /// Assign the named buffer to a binding slot for the next
    /// [`create_bind_group`](Self::create_bind_group) call.
    pub fn bind(&mut self, key: &str, slot: u32) -> Result<(), RegistryError> {
        if !self.buffers.contains_key(key) {
            return Err(RegistryError::NotFound(key.to_string()));
        }
        if let Some((_, existing)) = self.bindings.iter().find(|(s, _)| *s == slot) {
            return Err(RegistryError::SlotInUse {
                slot,
                key: existing.clone(),
            });
        }
        self.bindings.push((slot, key.to_string()));
        Ok(())
    }

    /// Slots currently assigned, in bind order.
    pub fn bound_slots(&self) -> impl Iterator<Item = (u32, &str)> {
        self.bindings.iter().map(|(s, k)| (*s, k.as_str()))
    }

    /// Materialize the recorded slot assignments as a bind group against the
    /// given layout. Entries not covered by registry bindings must be added
    /// by the caller via `extra` (e.g. a params uniform at slot 0).
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        extra: &[wgpu::BindGroupEntry],
    ) -> wgpu::BindGroup {
        let mut entries: Vec<wgpu::BindGroupEntry> = extra.to_vec();
        for (slot, key) in &self.bindings {
            // bind() verified existence and remove_buffer purges its
            // bindings, so a miss here is a registry bug; skip the entry
            // rather than panic mid-frame
            let Some(named) = self.buffers.get(key) else {
                log::error!("registry: binding slot {slot} refers to removed buffer '{key}'");
                continue;
            };
            entries.push(wgpu::BindGroupEntry {
                binding: *slot,
                resource: named.buffer.as_entire_binding(),
            });
        }
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &entries,
        })
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Registered keys with element counts and type names, for the inspector.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &NamedBuffer)> {
        self.buffers.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop binding-slot assignments that refer to `key`. Split out of
/// [`BufferRegistry::remove_buffer`] so the cleanup is testable without a
/// device.
fn purge_bindings(bindings: &mut Vec<(u32, String)>, key: &str) {
    bindings.retain(|(_, k)| k != key);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_purges_matching_bindings() {
        let mut bindings = vec![
            (1, "particle_positions".to_string()),
            (2, "particle_velocities".to_string()),
        ];
        purge_bindings(&mut bindings, "particle_positions");
        assert_eq!(bindings, vec![(2, "particle_velocities".to_string())]);

        // Unknown keys leave the assignments untouched
        purge_bindings(&mut bindings, "never_created");
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_lookups_on_empty_registry_fail() {
        let mut registry = BufferRegistry::new();
        assert!(matches!(
            registry.get_buffer("missing"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            registry.remove_buffer("missing"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            registry.bind("missing", 1),
            Err(RegistryError::NotFound(_))
        ));
    }
}
