//! Lifecycle integration tests.
//!
//! These tests drive resources through the public API the way an
//! application does: create and dispose on any thread, prepare and drain on
//! the context thread. Tests are parameterized using `rstest` to run against
//! both creation paths, with debug labeling on and off.
//!
//! # Test Categories
//!
//! - **Disposal Tests**: idempotent dispose, destroy-before-create
//! - **Creation Tests**: idempotent creation, equivalent direct/indirect results
//! - **Shader Tests**: compile failures and staging block ownership
//! - **Label Tests**: label application gated by capability
//! - **Threading Tests**: concurrent producers with a single drain

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{capabilities, Path, TestContext};
use deferred_gl::{
    BufferDescriptor, BufferUsage, DeferredLifecycle, GraphicsError, ObjectKind,
    ShaderDescriptor, ShaderStage, StorageHint,
};

const FRAGMENT_SOURCE: &[u8] = b"void main(){}";

// ============================================================================
// Disposal Tests
// ============================================================================

#[rstest]
#[case::direct(Path::Direct)]
#[case::indirect(Path::Indirect)]
fn test_dispose_is_idempotent(#[case] path: Path) {
    let mut ctx = TestContext::new(capabilities(path, true));
    let buffer = ctx
        .device
        .create_buffer(&BufferDescriptor::new(64, BufferUsage::UNIFORM))
        .unwrap();
    let shader = ctx
        .device
        .create_shader(&ShaderDescriptor::vertex(FRAGMENT_SOURCE.to_vec(), "main"))
        .unwrap();

    for _ in 0..4 {
        buffer.dispose();
        shader.dispose();
        assert!(buffer.is_disposed());
        assert!(shader.is_disposed());
    }
    assert_eq!(ctx.device.pending_disposals(), 2);

    let report = ctx.executor.drain_disposals();
    assert_eq!(report.destroyed, 2);
    assert!(report.is_clean());
    assert_eq!(ctx.executor.drain_disposals().destroyed, 0);
}

#[rstest]
#[case::direct(Path::Direct)]
#[case::indirect(Path::Indirect)]
fn test_unused_resources_make_no_native_calls(#[case] path: Path) {
    let mut ctx = TestContext::new(capabilities(path, true));
    let buffer = ctx
        .device
        .create_buffer(&BufferDescriptor::new(512, BufferUsage::VERTEX).with_label("unused_vb"))
        .unwrap();
    let shader = ctx
        .device
        .create_shader(&ShaderDescriptor::fragment(FRAGMENT_SOURCE.to_vec(), "main"))
        .unwrap();

    buffer.dispose();
    shader.dispose();
    ctx.executor.drain_disposals();

    assert!(ctx.gl().calls().is_empty());
    assert!(!shader.holds_source());
    let stats = ctx.device.staging_pool().stats();
    assert_eq!(stats.freed, 1);
    assert_eq!(stats.outstanding(), 0);
}

#[rstest]
#[case::direct(Path::Direct)]
#[case::indirect(Path::Indirect)]
fn test_disposed_shader_is_never_compiled(#[case] path: Path) {
    let mut ctx = TestContext::new(capabilities(path, false));
    let shader = ctx
        .device
        .create_shader(&ShaderDescriptor::fragment(FRAGMENT_SOURCE.to_vec(), "main"))
        .unwrap();
    shader.dispose();

    assert_eq!(
        ctx.executor.ensure_created(shader.as_ref()),
        Err(GraphicsError::ResourceDisposed {
            name: String::new()
        })
    );

    ctx.executor.drain_disposals();
    assert_eq!(ctx.gl().call_count("glCreateShader"), 0);
    assert_eq!(ctx.device.staging_pool().stats().freed, 1);
}

// ============================================================================
// Creation Tests
// ============================================================================

#[rstest]
#[case::direct_labeled(Path::Direct, true)]
#[case::direct_unlabeled(Path::Direct, false)]
#[case::indirect_labeled(Path::Indirect, true)]
#[case::indirect_unlabeled(Path::Indirect, false)]
fn test_dynamic_buffer_scenario(#[case] path: Path, #[case] labels: bool) {
    let mut ctx = TestContext::new(capabilities(path, labels));
    let buffer = ctx
        .device
        .create_buffer(&BufferDescriptor::new(256, BufferUsage::DYNAMIC))
        .unwrap();

    ctx.executor.ensure_created(buffer.as_ref()).unwrap();
    assert!(buffer.is_created());
    let handle = buffer.native_handle().unwrap();
    let allocation = ctx.gl().buffer_allocation(handle).unwrap();
    assert_eq!(allocation.size, 256);
    assert_eq!(allocation.hint, StorageHint::Dynamic);

    buffer.dispose();
    ctx.executor.drain_disposals();
    assert_eq!(ctx.gl().call_count("glDeleteBuffers"), 1);
    assert_eq!(ctx.gl().live_buffers(), 0);
    assert!(!buffer.is_created());
}

#[rstest]
#[case::direct(Path::Direct, "glCreateBuffers")]
#[case::indirect(Path::Indirect, "glGenBuffers")]
fn test_creation_happens_once(#[case] path: Path, #[case] create_call: &str) {
    let mut ctx = TestContext::new(capabilities(path, true));
    let buffer = ctx
        .device
        .create_buffer(&BufferDescriptor::new(1024, BufferUsage::INDEX))
        .unwrap();

    for _ in 0..5 {
        ctx.executor.ensure_created(buffer.as_ref()).unwrap();
    }
    assert_eq!(ctx.gl().call_count(create_call), 1);

    buffer.dispose();
    ctx.executor.drain_disposals();
}

#[rstest]
fn test_both_paths_allocate_equivalently(
    #[values(1, 256, 65536)] size: u32,
    #[values(BufferUsage::VERTEX, BufferUsage::UNIFORM | BufferUsage::DYNAMIC)] usage: BufferUsage,
) {
    let allocations: Vec<_> = [Path::Direct, Path::Indirect]
        .into_iter()
        .map(|path| {
            let mut ctx = TestContext::new(capabilities(path, false));
            let buffer = ctx
                .device
                .create_buffer(&BufferDescriptor::new(size, usage))
                .unwrap();
            ctx.executor.ensure_created(buffer.as_ref()).unwrap();
            let allocation = buffer
                .native_handle()
                .and_then(|handle| ctx.gl().buffer_allocation(handle));
            buffer.dispose();
            ctx.executor.drain_disposals();
            allocation
        })
        .collect();

    assert_eq!(allocations[0], allocations[1]);
    let allocation = allocations[0].unwrap();
    assert_eq!(allocation.size, size);
    assert_eq!(allocation.hint, usage.storage_hint());
}

#[test]
fn test_failed_creation_can_be_retried() {
    let mut ctx = TestContext::new(capabilities(Path::Indirect, false));
    let buffer = ctx
        .device
        .create_buffer(&BufferDescriptor::new(128, BufferUsage::VERTEX))
        .unwrap();

    ctx.gl().fail_next("glBufferData", 0x0505);
    let err = ctx.executor.ensure_created(buffer.as_ref()).unwrap_err();
    assert!(err.is_native());
    assert!(!buffer.is_created());
    assert_eq!(ctx.gl().live_buffers(), 0);

    ctx.executor.ensure_created(buffer.as_ref()).unwrap();
    assert!(buffer.is_created());

    buffer.dispose();
    ctx.executor.drain_disposals();
}

#[test]
fn test_destroy_error_leaves_resource_inert() {
    let mut ctx = TestContext::new(capabilities(Path::Direct, false));
    let buffer = ctx
        .device
        .create_buffer(&BufferDescriptor::new(32, BufferUsage::VERTEX))
        .unwrap();
    ctx.executor.ensure_created(buffer.as_ref()).unwrap();

    ctx.gl().fail_next("glDeleteBuffers", 0x0502);
    buffer.dispose();
    let report = ctx.executor.drain_disposals();
    assert_eq!(
        report.failures,
        vec![GraphicsError::NativeCallFailed {
            call: "glDeleteBuffers",
            code: 0x0502
        }]
    );
    assert!(!buffer.is_created());
    assert!(DeferredLifecycle::is_disposed(buffer.as_ref()));
}

// ============================================================================
// Shader Tests
// ============================================================================

#[rstest]
#[case::direct(Path::Direct)]
#[case::indirect(Path::Indirect)]
fn test_shader_compile_failure(#[case] path: Path) {
    let mut ctx = TestContext::new(capabilities(path, true));
    let shader = ctx
        .device
        .create_shader(
            &ShaderDescriptor::fragment(b"void main() { oops }".to_vec(), "main")
                .with_label("broken_fs"),
        )
        .unwrap();

    ctx.gl()
        .fail_next_compile("0:1(15): error: `oops' undeclared");
    let err = ctx.executor.ensure_created(shader.as_ref()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("broken_fs"));
    assert!(message.contains("`oops' undeclared"));
    assert!(matches!(
        err,
        GraphicsError::CompilationFailed {
            stage: ShaderStage::Fragment,
            ..
        }
    ));
    assert_eq!(ctx.gl().live_shaders(), 0);
    assert_eq!(ctx.device.staging_pool().stats().freed, 0);

    shader.dispose();
    ctx.executor.drain_disposals();
    assert_eq!(ctx.device.staging_pool().stats().freed, 1);
    assert_eq!(ctx.gl().call_count("glDeleteShader"), 1);
}

#[test]
fn test_invalid_utf8_source_fails_to_compile() {
    let mut ctx = TestContext::new(capabilities(Path::Direct, false));
    let shader = ctx
        .device
        .create_shader(&ShaderDescriptor::vertex(vec![0xff, 0xfe, 0x00], "main"))
        .unwrap();

    let err = ctx.executor.ensure_created(shader.as_ref()).unwrap_err();
    assert!(err.to_string().contains("not valid UTF-8"));

    shader.dispose();
    ctx.executor.drain_disposals();
    assert_eq!(ctx.device.staging_pool().stats().outstanding(), 0);
}

#[test]
fn test_shader_source_passed_with_exact_length() {
    let mut ctx = TestContext::new(capabilities(Path::Direct, false));
    let shader = ctx
        .device
        .create_shader(&ShaderDescriptor::fragment(FRAGMENT_SOURCE.to_vec(), "main"))
        .unwrap();

    ctx.executor.ensure_created(shader.as_ref()).unwrap();
    let handle = shader.native_handle().unwrap();
    assert_eq!(
        ctx.gl().shader_source_of(handle).as_deref(),
        Some(FRAGMENT_SOURCE)
    );
    assert_eq!(ctx.gl().shader_type_of(handle), Some(0x8B30));
    assert_eq!(ctx.device.staging_pool().stats().freed, 1);

    shader.dispose();
    ctx.executor.drain_disposals();
    // Already consumed by compilation; not freed a second time.
    assert_eq!(ctx.device.staging_pool().stats().freed, 1);
}

// ============================================================================
// Label Tests
// ============================================================================

#[rstest]
#[case::direct_labeled(Path::Direct, true)]
#[case::direct_unlabeled(Path::Direct, false)]
#[case::indirect_labeled(Path::Indirect, true)]
#[case::indirect_unlabeled(Path::Indirect, false)]
fn test_label_propagation(#[case] path: Path, #[case] labels: bool) {
    let mut ctx = TestContext::new(capabilities(path, labels));
    let buffer = ctx
        .device
        .create_buffer(&BufferDescriptor::new(64, BufferUsage::STORAGE_READ))
        .unwrap();
    buffer.set_name("particles");

    ctx.executor.ensure_created(buffer.as_ref()).unwrap();
    let expected = usize::from(labels);
    assert_eq!(ctx.gl().call_count("glObjectLabel"), expected);

    // No further label without a name change.
    ctx.executor.ensure_created(buffer.as_ref()).unwrap();
    assert_eq!(ctx.gl().call_count("glObjectLabel"), expected);

    buffer.set_name("particles_v2");
    ctx.executor.ensure_created(buffer.as_ref()).unwrap();
    ctx.executor.ensure_created(buffer.as_ref()).unwrap();
    assert_eq!(ctx.gl().call_count("glObjectLabel"), 2 * expected);

    let handle = buffer.native_handle().unwrap();
    let label = ctx.gl().label_of(ObjectKind::Buffer, handle);
    assert_eq!(label.as_deref(), labels.then_some("particles_v2"));

    buffer.dispose();
    ctx.executor.drain_disposals();
}

#[test]
fn test_label_failure_is_not_fatal() {
    let mut ctx = TestContext::new(capabilities(Path::Direct, true));
    let buffer = ctx
        .device
        .create_buffer(&BufferDescriptor::new(64, BufferUsage::VERTEX).with_label("vb"))
        .unwrap();

    ctx.gl().fail_next("glObjectLabel", 0x0501);
    ctx.executor.ensure_created(buffer.as_ref()).unwrap();
    assert!(buffer.is_created());

    buffer.dispose();
    ctx.executor.drain_disposals();
}

// ============================================================================
// Threading Tests
// ============================================================================

#[test]
fn test_concurrent_producers_single_drain() {
    let mut ctx = TestContext::new(capabilities(Path::Direct, true));

    let producers: Vec<_> = (0..4)
        .map(|thread| {
            let device = Arc::clone(&ctx.device);
            std::thread::spawn(move || {
                let mut resources = Vec::new();
                for i in 0..25 {
                    let buffer = device
                        .create_buffer(
                            &BufferDescriptor::new(16 * (i + 1), BufferUsage::VERTEX)
                                .with_label(format!("t{thread}_b{i}")),
                        )
                        .unwrap();
                    let shader = device
                        .create_shader(&ShaderDescriptor::vertex(FRAGMENT_SOURCE.to_vec(), "main"))
                        .unwrap();
                    resources.push((buffer, shader));
                }
                resources
            })
        })
        .collect();

    let resources: Vec<_> = producers
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    // Use half of them on the context thread.
    for (buffer, shader) in resources.iter().step_by(2) {
        ctx.executor.ensure_created(buffer.as_ref()).unwrap();
        ctx.executor.ensure_created(shader.as_ref()).unwrap();
    }

    // Dispose everything from other threads, twice over.
    let resources = Arc::new(resources);
    let disposers: Vec<_> = (0..2)
        .map(|_| {
            let resources = Arc::clone(&resources);
            std::thread::spawn(move || {
                for (buffer, shader) in resources.iter() {
                    buffer.dispose();
                    shader.dispose();
                }
            })
        })
        .collect();
    for handle in disposers {
        handle.join().unwrap();
    }

    assert_eq!(ctx.device.pending_disposals(), 200);
    let report = ctx.executor.drain_disposals();
    assert_eq!(report.destroyed, 200);
    assert!(report.is_clean());

    assert_eq!(ctx.gl().live_buffers(), 0);
    assert_eq!(ctx.gl().live_shaders(), 0);
    assert_eq!(ctx.gl().call_count("glDeleteBuffers"), 50);
    assert_eq!(ctx.gl().call_count("glDeleteShader"), 50);
    assert_eq!(ctx.device.staging_pool().stats().outstanding(), 0);
}
