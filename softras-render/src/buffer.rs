// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Vertex and index buffers.
//!
//! Plain owned payloads. A vertex buffer is an ordered sequence of 32-bit
//! floats that attribute fetch reinterprets per the vertex array's
//! declared attribute types; an index buffer is a sequence of 32-bit
//! vertex ids. Both are immutable for the duration of a draw.

/// Raw vertex data, consumed by attribute fetch.
#[derive(Debug, Clone, Default)]
pub struct VertexBuffer {
    pub data: Vec<f32>,
}

impl VertexBuffer {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Payload length in bytes, the bound attribute fetch checks against.
    pub fn byte_len(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// Vertex-id stream for indexed draws.
#[derive(Debug, Clone, Default)]
pub struct IndexBuffer {
    pub data: Vec<u32>,
}

impl IndexBuffer {
    pub fn new(data: Vec<u32>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_buffer_byte_len() {
        let vbo = VertexBuffer::new(vec![0.0; 6]);
        assert_eq!(vbo.byte_len(), 24);
    }

    #[test]
    fn test_index_buffer_len() {
        let ibo = IndexBuffer::new(vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(ibo.len(), 6);
        assert!(!ibo.is_empty());
    }
}
