//! 生成服务客户端：线上格式（wire）、抽象（traits）、HTTP 实现（http）与 Mock（mock）

pub mod http;
pub mod mock;
pub mod traits;
pub mod wire;

pub use http::HttpSolverBackend;
pub use mock::MockSolverBackend;
pub use traits::SolverBackend;
pub use wire::{ErrorBody, GenerateRequest, GenerateResponse, GenerationOutcome, Solution};
