//! Decoding of the single JSON object a kernel prints on stdout.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum RawResponse {
    Success {
        values: Vec<i64>,
        compute: f64,
        code: i32,
    },
    Failure {
        error: String,
        code: i32,
    },
}

/// A kernel's answer, tagged once at the process boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelResponse {
    Ok { values: Vec<i64>, compute: f64 },
    Err { message: String, code: i32 },
}

impl KernelResponse {
    pub fn decode(stdout: &str) -> Result<Self, serde_json::Error> {
        let raw: RawResponse = serde_json::from_str(stdout.trim())?;
        Ok(match raw {
            RawResponse::Success {
                values,
                compute,
                code: 0,
            } => KernelResponse::Ok { values, compute },
            RawResponse::Success { code, .. } => KernelResponse::Err {
                message: format!("kernel reported non-zero code {code} alongside values"),
                code,
            },
            RawResponse::Failure { error, code } => KernelResponse::Err {
                message: error,
                code,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_success() {
        let response =
            KernelResponse::decode("{\"values\": [9,7], \"compute\": 3, \"code\": 0}\n").unwrap();
        assert_eq!(
            response,
            KernelResponse::Ok {
                values: vec![9, 7],
                compute: 3.0
            }
        );
    }

    #[test]
    fn decodes_argument_error() {
        let text = r#"{"error": "must provide as many inputs as there are arguments (5 vs 4 provided)", "code": 1}"#;
        match KernelResponse::decode(text).unwrap() {
            KernelResponse::Err { message, code } => {
                assert_eq!(code, 1);
                assert!(message.contains("5 vs 4"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn success_shape_with_nonzero_code_is_an_error() {
        let response = KernelResponse::decode(r#"{"values": [], "compute": 0, "code": 2}"#).unwrap();
        assert!(matches!(response, KernelResponse::Err { code: 2, .. }));
    }

    #[test]
    fn rejects_garbage() {
        assert!(KernelResponse::decode("Segmentation fault").is_err());
        assert!(KernelResponse::decode(r#"{"values": [1]}"#).is_err());
    }
}
