use std::sync::Arc;

use super::handler::{PacketHandler, SessionContext};
use super::packet::PacketCode;
use super::payload::{FaceData, Payload, PayloadError, PoseData};
use super::session::SessionEvent;

pub struct HeartBeatRspHandler;

impl PacketHandler for HeartBeatRspHandler {
    fn parse_payload(&self, _code: PacketCode, _payload: &[u8]) -> Result<Payload, PayloadError> {
        Ok(Payload::Empty)
    }

    fn handle(&self, context: &mut SessionContext<'_>, _code: PacketCode, _payload: Payload) {
        context.heartbeat.record_response(context.now);
        log::trace!("Heartbeat response");
    }
}

pub struct FaceDataHandler;

impl PacketHandler for FaceDataHandler {
    fn parse_payload(&self, _code: PacketCode, payload: &[u8]) -> Result<Payload, PayloadError> {
        FaceData::decode(payload).map(Payload::Face)
    }

    fn handle(&self, context: &mut SessionContext<'_>, code: PacketCode, payload: Payload) {
        let Payload::Face(data) = payload else {
            log::warn!("{code:?} carried an unexpected payload");
            return;
        };
        for actor in context.actors.iter_mut() {
            actor.update_face(&data);
        }
    }
}

pub struct PoseDataHandler;

impl PacketHandler for PoseDataHandler {
    fn parse_payload(&self, _code: PacketCode, payload: &[u8]) -> Result<Payload, PayloadError> {
        PoseData::decode(payload).map(Payload::Pose)
    }

    fn handle(&self, context: &mut SessionContext<'_>, code: PacketCode, payload: Payload) {
        let Payload::Pose(data) = payload else {
            log::warn!("{code:?} carried an unexpected payload");
            return;
        };
        for actor in context.actors.iter_mut() {
            actor.update_pose(&data);
        }
    }
}

pub struct QuitNotifyHandler;

impl PacketHandler for QuitNotifyHandler {
    fn parse_payload(&self, _code: PacketCode, _payload: &[u8]) -> Result<Payload, PayloadError> {
        Ok(Payload::Empty)
    }

    fn handle(&self, context: &mut SessionContext<'_>, _code: PacketCode, _payload: Payload) {
        log::info!("Server quit");
        context.request_shutdown(SessionEvent::ServerQuit);
    }
}

pub struct DisconnectHandler;

impl PacketHandler for DisconnectHandler {
    fn parse_payload(&self, _code: PacketCode, _payload: &[u8]) -> Result<Payload, PayloadError> {
        Ok(Payload::Empty)
    }

    fn handle(&self, context: &mut SessionContext<'_>, _code: PacketCode, _payload: Payload) {
        log::info!("Disconnected by server");
        context.request_shutdown(SessionEvent::ServerDisconnected);
    }
}

pub fn default_table() -> Vec<(PacketCode, Arc<dyn PacketHandler>)> {
    let heartbeat: Arc<dyn PacketHandler> = Arc::new(HeartBeatRspHandler);
    let face: Arc<dyn PacketHandler> = Arc::new(FaceDataHandler);
    let pose: Arc<dyn PacketHandler> = Arc::new(PoseDataHandler);
    let quit: Arc<dyn PacketHandler> = Arc::new(QuitNotifyHandler);
    let disconnect: Arc<dyn PacketHandler> = Arc::new(DisconnectHandler);

    vec![
        (PacketCode::HeartBeatRsp, heartbeat),
        (PacketCode::FaceData, face),
        (PacketCode::PoseData, pose),
        (PacketCode::QuitNotify, quit),
        (PacketCode::Disconnect, disconnect),
    ]
}
