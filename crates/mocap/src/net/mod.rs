mod handler;
mod handlers;
mod heartbeat;
pub mod packet;
mod payload;
mod session;

pub use handler::{HandlerRegistry, PacketHandler, RegistryError, SessionContext};
pub use handlers::{
    DisconnectHandler, FaceDataHandler, HeartBeatRspHandler, PoseDataHandler, QuitNotifyHandler,
    default_table,
};
pub use heartbeat::HeartbeatMonitor;
pub use packet::{Frame, PACKET_HEAD, PACKET_TAIL, PacketCode, PacketError};
pub use payload::{BlendShapeWeight, FaceData, Landmark, Payload, PayloadError, PoseData};
pub use session::{
    ReceiveCounts, ReceiveStats, ReceivedPacket, Session, SessionError, SessionEvent, SessionState,
};
