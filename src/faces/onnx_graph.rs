//! Reads graph initializers straight from an ONNX model file.
//!
//! The swap model keeps its identity projection matrix as the last graph
//! initializer, which ONNX Runtime does not expose. Only the messages and
//! fields on the path to it are declared; everything else is skipped by the
//! decoder.
//!
//! ```text
//! ModelProto.graph (7) -> GraphProto.initializer (5, repeated)
//!   -> TensorProto { dims (1), data_type (2), float_data (4), name (8), raw_data (9) }
//! ```

use crate::error::{Result, SwapError};
use bytes::Bytes;
use prost::Message;

/// `TensorProto.DataType.FLOAT`
const FLOAT: i32 = 1;

#[derive(Clone, PartialEq, Message)]
struct ModelProto {
    #[prost(message, optional, tag = "7")]
    graph: Option<GraphProto>,
}

#[derive(Clone, PartialEq, Message)]
struct GraphProto {
    #[prost(message, repeated, tag = "5")]
    initializer: Vec<TensorProto>,
}

#[derive(Clone, PartialEq, Message)]
struct TensorProto {
    #[prost(int64, repeated, tag = "1")]
    dims: Vec<i64>,
    #[prost(int32, tag = "2")]
    data_type: i32,
    #[prost(float, repeated, tag = "4")]
    float_data: Vec<f32>,
    #[prost(string, tag = "8")]
    name: String,
    // zero-copy slice of the model buffer
    #[prost(bytes = "bytes", tag = "9")]
    raw_data: Bytes,
}

/// A float tensor stored inside a model file
#[derive(Debug, Clone, PartialEq)]
pub struct Initializer {
    pub name: String,
    pub dims: Vec<usize>,
    pub data: Vec<f32>,
}

/// The last initializer of the model's main graph
pub fn last_initializer(model: Bytes) -> Result<Initializer> {
    let model = ModelProto::decode(model).map_err(|e| malformed(&e.to_string()))?;
    let tensor = model
        .graph
        .ok_or_else(|| malformed("model has no graph"))?
        .initializer
        .pop()
        .ok_or_else(|| malformed("graph has no initializers"))?;
    into_initializer(tensor)
}

fn malformed(message: &str) -> SwapError {
    SwapError::Model(format!("malformed ONNX model: {}", message))
}

fn into_initializer(tensor: TensorProto) -> Result<Initializer> {
    let TensorProto {
        dims,
        data_type,
        float_data,
        name,
        raw_data,
    } = tensor;

    if data_type != FLOAT {
        return Err(malformed(&format!(
            "initializer '{}' has data type {}, expected float",
            name, data_type
        )));
    }

    let dims = dims
        .into_iter()
        .map(|d| {
            usize::try_from(d)
                .map_err(|_| malformed(&format!("negative dimension in '{}'", name)))
        })
        .collect::<Result<Vec<_>>>()?;

    let data: Vec<f32> = if raw_data.is_empty() {
        float_data
    } else {
        raw_data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    };

    let expected: usize = dims.iter().product();
    if data.len() != expected {
        return Err(malformed(&format!(
            "initializer '{}' holds {} values for shape {:?}",
            name,
            data.len(),
            dims
        )));
    }

    Ok(Initializer { name, dims, data })
}
