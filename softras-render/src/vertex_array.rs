// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Vertex array descriptors.
//!
//! A vertex array is an ordered list of attribute descriptors (the list
//! position is the attribute's location) plus an optional index buffer.
//! It owns no data; attribute fetch follows the buffer handles at draw
//! time.

use crate::buffer::{IndexBuffer, VertexBuffer};
use crate::store::Handle;

/// Shape of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    I32,
    F32,
    Vec2,
    IVec2,
    Vec3,
    IVec3,
    Vec4,
    IVec4,
    Mat3,
    Mat4,
}

impl AttributeType {
    /// Bytes consumed from the vertex buffer per fetch.
    pub fn byte_size(self) -> usize {
        match self {
            AttributeType::I32 | AttributeType::F32 => 4,
            AttributeType::Vec2 | AttributeType::IVec2 => 8,
            AttributeType::Vec3 | AttributeType::IVec3 => 12,
            AttributeType::Vec4 | AttributeType::IVec4 => 16,
            AttributeType::Mat3 => 36,
            AttributeType::Mat4 => 64,
        }
    }
}

/// One attribute descriptor: where to fetch and how to interpret it.
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// Buffer to sample from.
    pub buffer: Handle<VertexBuffer>,
    /// Shape of a single sample.
    pub ty: AttributeType,
    /// Bytes between consecutive samples.
    pub stride: usize,
    /// Byte offset of the first sample.
    pub offset: usize,
}

/// Ordered attribute list plus optional index buffer.
#[derive(Debug, Clone, Default)]
pub struct VertexArray {
    attributes: Vec<VertexAttribute>,
    index_buffer: Option<Handle<IndexBuffer>>,
}

impl VertexArray {
    pub fn new(attributes: Vec<VertexAttribute>, index_buffer: Option<Handle<IndexBuffer>>) -> Self {
        Self {
            attributes,
            index_buffer,
        }
    }

    /// Append an attribute; its location is the current list length.
    pub fn add_attribute(&mut self, attr: VertexAttribute) {
        self.attributes.push(attr);
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn index_buffer(&self) -> Option<Handle<IndexBuffer>> {
        self.index_buffer
    }
}
