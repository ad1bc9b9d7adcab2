pub mod request;
pub mod response;

pub use request::{
    CodeConnectArgs, DesignContextArgs, DesignSystemRulesArgs, FigjamArgs, InvalidRequest,
    JsonRpcRequest, NodeArgs, RpcId, ScreenshotArgs, ToolCallParams, WhoamiArgs,
};
pub use response::{JsonRpcError, JsonRpcResponse, ToolResult, ToolResultContent};
