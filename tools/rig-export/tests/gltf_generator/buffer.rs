//! Binary buffer packing.

use serde_json::{Value, json};

/// Single buffer with one view per pushed array, each 4-byte aligned
#[derive(Default)]
pub(crate) struct BufferBuilder {
    data: Vec<u8>,
    views: Vec<Value>,
}

impl BufferBuilder {
    /// Append little-endian floats, returning the buffer view index
    pub(crate) fn push_f32(&mut self, values: impl IntoIterator<Item = f32>) -> usize {
        let start = self.data.len();
        for value in values {
            self.data.extend_from_slice(&value.to_le_bytes());
        }
        self.finish_view(start)
    }

    /// Append little-endian u16s, returning the buffer view index
    pub(crate) fn push_u16(&mut self, values: impl IntoIterator<Item = u16>) -> usize {
        let start = self.data.len();
        for value in values {
            self.data.extend_from_slice(&value.to_le_bytes());
        }
        self.finish_view(start)
    }

    fn finish_view(&mut self, start: usize) -> usize {
        let length = self.data.len() - start;
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": start,
            "byteLength": length
        }));
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        self.views.len() - 1
    }

    pub(crate) fn views(&self) -> &[Value] {
        &self.views
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.data
    }
}
