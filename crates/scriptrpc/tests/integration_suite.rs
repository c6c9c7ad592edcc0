//! Integration tests for scriptrpc: a loopback server answering over the inbox.

use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;

use mvalue::EngineValue;
use mvalue::EntityKind;
use mvalue::EntityRef;
use mvalue::ScriptValue;
use mvalue::raw;

use scriptrpc::AnswerError;
use scriptrpc::AnswerId;
use scriptrpc::Core;
use scriptrpc::CoreError;
use scriptrpc::Dispatcher;
use scriptrpc::Resource;
use scriptrpc::ResourceConfig;
use scriptrpc::ResourceId;
use scriptrpc::RpcConfig;
use scriptrpc::bindings;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A call on its way to the server.
#[derive(Debug)]
struct Outbound {
    id: AnswerId,
    name: String,
    args: Vec<EngineValue>,
}

/// Forwards every call to a server task over a channel.
struct LoopbackCore {
    next_id: u16,
    outbound: mpsc::UnboundedSender<Outbound>,
    entities: Vec<EntityRef>,
}

impl LoopbackCore {
    fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { next_id: 0, outbound: tx, entities: Vec::new() }, rx)
    }
}

impl Core for LoopbackCore {
    fn trigger_server_rpc_event(&mut self, name: &str, args: &[EngineValue]) -> Result<AnswerId, CoreError> {
        let id = AnswerId(self.next_id);
        self.outbound
            .send(Outbound { id, name: name.to_string(), args: args.to_vec() })
            .map_err(|_| CoreError::Disconnected)?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    fn streamed_in_virtual_entities(&self) -> Vec<EntityRef> {
        self.entities.clone()
    }
}

// --- Test 1: Out-of-order answers ---

#[tokio::test]
async fn test_answers_in_any_order() -> anyhow::Result<()> {
    init_tracing();
    let (core, mut server_rx) = LoopbackCore::new();
    let mut dispatcher = Dispatcher::new(core, RpcConfig::default());
    let answers = dispatcher.answer_sender();
    let resource = Resource::new(ResourceId(1), "game");

    const CALLS: i64 = 16;
    let mut pending = Vec::new();
    for n in 0..CALLS {
        pending.push((n, dispatcher.send_rpc(&resource, "echo", &[ScriptValue::BigInt(n)])?));
    }

    let server = tokio::spawn(async move {
        let mut calls = Vec::new();
        for _ in 0..CALLS {
            calls.push(server_rx.recv().await.context("core hung up")?);
        }
        calls.shuffle(&mut rand::thread_rng());
        for call in calls {
            answers.send(call.id, call.args[0].clone(), "")?;
        }
        anyhow::Ok(())
    });
    server.await??;

    assert_eq!(dispatcher.pump_answers(), CALLS as usize);
    assert_eq!(dispatcher.pending_count(), 0);
    for (n, answer) in pending {
        assert_eq!(answer.await, Ok(ScriptValue::BigInt(n)));
    }
    Ok(())
}

// --- Test 2: Remote failures ---

#[tokio::test]
async fn test_remote_failure_reaches_caller() -> anyhow::Result<()> {
    init_tracing();
    let (core, mut server_rx) = LoopbackCore::new();
    let mut dispatcher = Dispatcher::new(core, RpcConfig::default());
    let answers = dispatcher.answer_sender();
    let resource = Resource::new(ResourceId(1), "game");

    let answer = bindings::send_rpc(&mut dispatcher, &resource, &[ScriptValue::from("missing")])?;

    let call = server_rx.recv().await.context("no call")?;
    assert_eq!(call.name, "missing");
    answers.send(call.id, EngineValue::None, "no handler registered for missing")?;

    dispatcher.pump_answers();
    assert_eq!(answer.await, Err(AnswerError::Remote("no handler registered for missing".into())));
    Ok(())
}

// --- Test 3: Raw mode end to end ---

#[tokio::test]
async fn test_raw_arguments_decoded_by_server() -> anyhow::Result<()> {
    init_tracing();
    let (core, mut server_rx) = LoopbackCore::new();
    let mut dispatcher = Dispatcher::new(core, RpcConfig::default());
    let answers = dispatcher.answer_sender();
    let resource = Resource::new(ResourceId(7), "fast")
        .with_config(ResourceConfig { raw_emit_enabled: true });

    let position = ScriptValue::Vector3([1.0, 2.0, 3.0]);
    let payload = ScriptValue::Object(vec![("hp".into(), ScriptValue::Number(87.5))]);
    let answer = dispatcher.send_rpc(&resource, "sync", &[position.clone(), payload.clone()])?;

    let call = server_rx.recv().await.context("no call")?;
    let mut decoded = Vec::new();
    for arg in &call.args {
        let EngineValue::ByteArray(bytes) = arg else { anyhow::bail!("expected raw bytes, got {:?}", arg) };
        decoded.push(raw::from_raw_bytes(bytes)?);
    }
    assert_eq!(decoded, vec![position, payload]);

    answers.send(call.id, EngineValue::UInt(decoded.len() as u64), "")?;
    dispatcher.pump_answers();
    assert_eq!(answer.await, Ok(ScriptValue::BigInt(2)));
    Ok(())
}

// --- Test 4: Teardown while awaiting ---

#[tokio::test]
async fn test_stop_cancels_awaiting_calls() -> anyhow::Result<()> {
    init_tracing();
    let (core, mut server_rx) = LoopbackCore::new();
    let mut dispatcher = Dispatcher::new(core, RpcConfig::default());
    let answers = dispatcher.answer_sender();
    let resource = Resource::new(ResourceId(3), "doomed");

    let answer = dispatcher.send_rpc(&resource, "slow", &[])?;
    let call = server_rx.recv().await.context("no call")?;

    assert_eq!(dispatcher.on_resource_stop(resource.id()), 1);
    answers.send(call.id, EngineValue::Bool(true), "")?;
    assert_eq!(dispatcher.pump_answers(), 0);

    assert_eq!(answer.await, Err(AnswerError::Cancelled));
    Ok(())
}

// --- Test 5: Timeouts ---

#[tokio::test]
async fn test_timeout_resolves_waiting_future() -> anyhow::Result<()> {
    init_tracing();
    let (core, _server_rx) = LoopbackCore::new();
    let timeout = Duration::from_millis(250);
    let mut dispatcher = Dispatcher::new(core, RpcConfig::new().with_answer_timeout(timeout));
    let resource = Resource::new(ResourceId(1), "game");

    let answer = dispatcher.send_rpc(&resource, "never", &[])?;
    assert_eq!(dispatcher.tick(Instant::now() + timeout), 1);
    assert_eq!(answer.await, Err(AnswerError::Timeout));
    Ok(())
}

// --- Test 6: Disconnected core ---

#[tokio::test]
async fn test_disconnected_core_fails_synchronously() {
    init_tracing();
    let (core, server_rx) = LoopbackCore::new();
    drop(server_rx);
    let mut dispatcher = Dispatcher::new(core, RpcConfig::default());
    let resource = Resource::new(ResourceId(1), "game");

    let err = dispatcher.send_rpc(&resource, "ping", &[]).unwrap_err();
    assert_eq!(err, scriptrpc::Error::Core(CoreError::Disconnected));
    assert_eq!(dispatcher.pending_count(), 0);
}

// --- Test 7: Boxed core and entity snapshots ---

#[test]
fn test_boxed_core_lists_entities() -> anyhow::Result<()> {
    init_tracing();
    let (mut core, _server_rx) = LoopbackCore::new();
    core.entities = vec![
        EntityRef::new(EntityKind::VirtualEntity, 1),
        EntityRef::new(EntityKind::VirtualEntity, 2),
    ];
    let boxed: Box<dyn Core> = Box::new(core);
    let dispatcher = Dispatcher::new(boxed, RpcConfig::default());

    let listed = bindings::get_streamed_in_virtual_entities(&dispatcher, &[])?;
    let ScriptValue::Array(items) = &listed else { anyhow::bail!("expected array, got {:?}", listed) };
    assert_eq!(items.len(), 2);
    assert_eq!(items[1], ScriptValue::Entity(EntityRef::new(EntityKind::VirtualEntity, 2)));
    Ok(())
}
