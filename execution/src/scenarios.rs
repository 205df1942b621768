use std::sync::Arc;

use core_types::{Backend, DataType, Layout, SignatureDescriptor};
use opdispatch_ops::{
    global, validate, AttrKind, AttrMap, AttrSpec, AttrValue, AttributeSchema, OpError, ParamType,
    RegistrationRecord, RegistryBuilder,
};

use crate::{DispatchCache, PromotionTable, Resolver};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn attrs(pairs: &[(&str, AttrValue)]) -> AttrMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn binary_sig(dt: DataType) -> SignatureDescriptor {
    SignatureDescriptor::new([dt, dt], [dt])
}

fn unary_sig(dt: DataType) -> SignatureDescriptor {
    SignatureDescriptor::new([dt], [dt])
}

/// "Mul" with one row per dtype
fn mul(backend: Backend, kernel: &str, dtypes: &[DataType]) -> RegistrationRecord {
    dtypes
        .iter()
        .fold(
            RegistrationRecord::builder("Mul", backend)
                .kernel_name(kernel)
                .input("x", ParamType::Required)
                .input("y", ParamType::Required)
                .output("output", ParamType::Required),
            |b, dt| b.dtype_format([*dt, *dt, *dt]),
        )
        .build()
        .unwrap()
}

/// "Transpose" with one row per dtype
fn transpose(kernel: &str, dtypes: &[DataType]) -> RegistrationRecord {
    dtypes
        .iter()
        .fold(
            RegistrationRecord::builder("Transpose", Backend::Cpu)
                .kernel_name(kernel)
                .input("x", ParamType::Required)
                .output("y", ParamType::Required),
            |b, dt| b.dtype_format([*dt, *dt]),
        )
        .build()
        .unwrap()
}

fn squeeze(backend: Backend) -> RegistrationRecord {
    RegistrationRecord::builder("Squeeze", backend)
        .attr(AttrSpec::required("axis", AttrKind::Int))
        .input("x", ParamType::Required)
        .output("y", ParamType::Required)
        .dtype_format([DataType::F32, DataType::F32])
        .build()
        .unwrap()
}

fn reduce_sum(backend: Backend) -> RegistrationRecord {
    RegistrationRecord::builder("ReduceSum", backend)
        .attr(AttrSpec::required("keep_dims", AttrKind::Bool))
        .input("x", ParamType::Required)
        .output("y", ParamType::Required)
        .dtype_format([DataType::F32, DataType::F32])
        .build()
        .unwrap()
}


/* ------------------------------------------------------------------------- */
/*                             End-to-end scenarios                          */
/* ------------------------------------------------------------------------- */
#[test]
fn mul_f32_resolves_on_cpu() {
    init_tracing();
    let builder = RegistryBuilder::new();
    builder.register(mul(Backend::Cpu, "mul_cpu", &[DataType::F32, DataType::I32])).unwrap();
    let registry = builder.finalize();

    let resolved = Resolver::new(&registry)
        .resolve("Mul", Backend::Cpu, &binary_sig(DataType::F32))
        .unwrap();
    assert_eq!(resolved.handle().symbol(), "mul_cpu");
    assert_eq!(resolved.signature(), &binary_sig(DataType::F32));
    assert!(!resolved.promoted());
}

#[test]
fn mul_f64_has_no_kernel() {
    init_tracing();
    let builder = RegistryBuilder::new();
    builder.register(mul(Backend::Cpu, "mul_cpu", &[DataType::F32, DataType::I32])).unwrap();
    let registry = builder.finalize();

    let err = Resolver::new(&registry)
        .resolve("Mul", Backend::Cpu, &binary_sig(DataType::F64))
        .unwrap_err();
    assert_eq!(
        err,
        OpError::NoMatchingKernel {
            op: "Mul".into(),
            backend: Backend::Cpu,
            requested: binary_sig(DataType::F64),
            supported: vec![binary_sig(DataType::F32), binary_sig(DataType::I32)],
        }
    );
}

#[test]
fn squeeze_rejects_float_axis() {
    let builder = RegistryBuilder::new();
    builder.register(squeeze(Backend::Cpu)).unwrap();
    let registry = builder.finalize();

    let err = validate(&registry, "Squeeze", Backend::Cpu, &attrs(&[("axis", 1.2.into())]))
        .unwrap_err();
    assert_eq!(
        err,
        OpError::AttributeTypeError {
            op: "Squeeze".into(),
            attribute: "axis".into(),
            expected: AttrKind::Int,
            actual: AttrValue::Float(1.2),
        }
    );
}

#[test]
fn reduce_sum_rejects_integer_keep_dims() {
    let builder = RegistryBuilder::new();
    builder.register(reduce_sum(Backend::Cpu)).unwrap();
    let registry = builder.finalize();

    let err = validate(&registry, "ReduceSum", Backend::Cpu, &attrs(&[("keep_dims", 1i64.into())]))
        .unwrap_err();
    assert_eq!(
        err,
        OpError::AttributeTypeError {
            op: "ReduceSum".into(),
            attribute: "keep_dims".into(),
            expected: AttrKind::Bool,
            actual: AttrValue::Int(1),
        }
    );
}

#[test]
fn batch_to_space_unregistered_on_backend() {
    let builder = RegistryBuilder::new();
    builder.register(mul(Backend::Cpu, "mul_cpu", &[DataType::F32])).unwrap();
    let registry = builder.finalize();

    let err = Resolver::new(&registry)
        .resolve("BatchToSpace", Backend::Gpu, &unary_sig(DataType::F16))
        .unwrap_err();
    assert_eq!(err, OpError::UnregisteredOperator { op: "BatchToSpace".into(), backend: Backend::Gpu });

    let err = validate(&registry, "BatchToSpace", Backend::Gpu, &attrs(&[])).unwrap_err();
    assert!(matches!(err, OpError::UnregisteredOperator { .. }));
}

#[test]
fn transpose_overlap_is_duplicate() {
    let builder = RegistryBuilder::new();
    builder.register(transpose("transpose_a", &[DataType::I32, DataType::F32])).unwrap();
    let err = builder.register(transpose("transpose_b", &[DataType::I32])).unwrap_err();
    assert_eq!(
        err,
        OpError::DuplicateSignature {
            op: "Transpose".into(),
            backend: Backend::Cpu,
            signature: unary_sig(DataType::I32),
        }
    );
}

#[test]
fn builtin_kernels_through_global_registry() {
    init_tracing();
    let registry = global().unwrap();
    let resolver = Resolver::new(registry);

    let mul = resolver.resolve("Mul", Backend::Cpu, &binary_sig(DataType::I32)).unwrap();
    assert_eq!(mul.handle().symbol(), "mul_cpu");

    let f16_5hd = DataType::F16.with(Layout::Nc1hwc0);
    let b2s = resolver
        .resolve(
            "BatchToSpace",
            Backend::Ascend,
            &SignatureDescriptor::new([f16_5hd], [f16_5hd]),
        )
        .unwrap();
    assert_eq!(b2s.handle().symbol(), "batch_to_space_d");
    assert!(b2s.record().props().partial_flag);

    let ok = validate(
        registry,
        "BatchToSpace",
        Backend::Ascend,
        &attrs(&[("block_size", 2i64.into()), ("crops", vec![vec![0i64, 0], vec![0, 0]].into())]),
    )
    .unwrap();
    assert_eq!(ok.int("block_size"), Some(2));
    assert_eq!(ok.int_list_list("crops"), Some(vec![vec![0, 0], vec![0, 0]]));

    let err = validate(registry, "Squeeze", Backend::Cpu, &attrs(&[("axis", 1.2.into())]))
        .unwrap_err();
    assert!(matches!(err, OpError::AttributeTypeError { expected: AttrKind::Int, .. }));

    let err = validate(registry, "ReduceSum", Backend::Cpu, &attrs(&[("keep_dims", 1i64.into())]))
        .unwrap_err();
    assert!(matches!(err, OpError::AttributeTypeError { expected: AttrKind::Bool, .. }));

    for bad in [DataType::F32, DataType::F64, DataType::U8, DataType::Bool] {
        let err = validate(registry, "Argmin", Backend::Cpu, &attrs(&[("output_type", bad.into())]))
            .unwrap_err();
        assert!(matches!(err, OpError::AttributeTypeError { .. }), "{bad}");
    }
    let ok = validate(registry, "Argmin", Backend::Cpu, &attrs(&[])).unwrap();
    assert_eq!(ok.int("axis"), Some(-1));
    assert_eq!(ok.dtype("output_type"), Some(DataType::I32));
}


/* ------------------------------------------------------------------------- */
/*                          Order and totality checks                        */
/* ------------------------------------------------------------------------- */
/// Every ordering of `items`
fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}

#[test]
fn disjoint_records_resolve_to_their_owner_in_any_order() {
    let groups: [(&str, &[DataType]); 3] = [
        ("mul_float", &[DataType::F32, DataType::F64]),
        ("mul_int", &[DataType::I32, DataType::I64]),
        ("mul_uint", &[DataType::U32]),
    ];
    for order in permutations(&groups) {
        let builder = RegistryBuilder::new();
        for (kernel, dtypes) in &order {
            builder.register(mul(Backend::Cpu, kernel, dtypes)).unwrap();
        }
        let registry = builder.finalize();
        let resolver = Resolver::with_promotions(&registry, PromotionTable::exact_only());

        for (kernel, dtypes) in &groups {
            for dt in *dtypes {
                let r = resolver.resolve("Mul", Backend::Cpu, &binary_sig(*dt)).unwrap();
                assert_eq!(r.handle().symbol(), *kernel);
            }
        }
    }
}

#[test]
fn duplicate_detected_regardless_of_order() {
    for first_wide in [true, false] {
        let wide = || transpose("transpose_wide", &[DataType::I32, DataType::I64]);
        let narrow = || transpose("transpose_narrow", &[DataType::I32]);
        let builder = RegistryBuilder::new();
        let (a, b) = if first_wide { (wide(), narrow()) } else { (narrow(), wide()) };
        builder.register(a).unwrap();
        assert!(matches!(builder.register(b), Err(OpError::DuplicateSignature { .. })));
    }
}

#[test]
fn resolve_is_idempotent() {
    let builder = RegistryBuilder::new();
    builder.register(mul(Backend::Cpu, "mul_f32", &[DataType::F32])).unwrap();
    builder.register(mul(Backend::Cpu, "mul_f64", &[DataType::F64])).unwrap();
    let registry = builder.finalize();
    let resolver = Resolver::new(&registry);

    for dt in [DataType::F16, DataType::F32, DataType::F64] {
        let a = resolver.resolve("Mul", Backend::Cpu, &binary_sig(dt)).unwrap();
        let b = resolver.resolve("Mul", Backend::Cpu, &binary_sig(dt)).unwrap();
        assert!(Arc::ptr_eq(a.record(), b.record()));
        assert_eq!(a.signature(), b.signature());
    }
}

#[test]
fn validation_is_total() {
    let schema = AttributeSchema::new(vec![
        AttrSpec::required("axis", AttrKind::Int),
        AttrSpec::optional("keep_dims", AttrKind::Bool, false),
        AttrSpec::required("crops", AttrKind::IntListList),
    ]);
    let axis_values = [None, Some(AttrValue::Int(1)), Some(AttrValue::Float(1.0))];
    let keep_values = [None, Some(AttrValue::Bool(true)), Some(AttrValue::Int(1))];
    let crops_values = [
        None,
        Some(AttrValue::from(vec![vec![0i64, 1]])),
        Some(AttrValue::List(vec![AttrValue::List(vec![AttrValue::Float(0.5)])])),
    ];

    for axis in &axis_values {
        for keep in &keep_values {
            for crops in &crops_values {
                let mut given = Vec::new();
                if let Some(v) = axis { given.push(("axis", v.clone())); }
                if let Some(v) = keep { given.push(("keep_dims", v.clone())); }
                if let Some(v) = crops { given.push(("crops", v.clone())); }

                let missing = axis.is_none() || crops.is_none();
                let wrong = matches!(axis, Some(AttrValue::Float(_)))
                    || matches!(keep, Some(AttrValue::Int(_)))
                    || matches!(crops, Some(AttrValue::List(l)) if l.iter().any(|i| i.as_int_list().is_none()));

                match schema.validate("Op", &attrs(&given)) {
                    Ok(normalized) => {
                        assert!(!missing && !wrong);
                        assert_eq!(normalized.len(), 3);
                        assert!(normalized.bool("keep_dims").is_some());
                    }
                    Err(OpError::MissingRequiredAttribute { .. }) => assert!(missing),
                    Err(OpError::AttributeTypeError { .. }) => assert!(!missing && wrong),
                    Err(other) => panic!("unexpected failure {other}"),
                }
            }
        }
    }
}

#[test]
fn f64_request_never_narrows_to_f32() {
    let builder = RegistryBuilder::new();
    builder.register(mul(Backend::Cpu, "mul_f32", &[DataType::F32])).unwrap();
    let registry = builder.finalize();

    for table in [PromotionTable::default(), PromotionTable::widening(), PromotionTable::exact_only()] {
        let resolver = Resolver::with_promotions(&registry, table);
        assert!(resolver.resolve("Mul", Backend::Cpu, &binary_sig(DataType::F64)).is_err());
        let out_only = SignatureDescriptor::new([DataType::F32, DataType::F32], [DataType::F64]);
        assert!(resolver.resolve("Mul", Backend::Cpu, &out_only).is_err());
    }
}

#[test]
fn concurrent_lookups_after_finalize() {
    let builder = RegistryBuilder::new();
    builder.register(mul(Backend::Cpu, "mul_cpu", &[DataType::F32, DataType::I32])).unwrap();
    builder.register(mul(Backend::Gpu, "mul_gpu", &[DataType::F16])).unwrap();
    builder
        .register(
            RegistrationRecord::builder("Relu", Backend::Gpu)
                .input("x", ParamType::Required)
                .output("y", ParamType::Required)
                .dtype_format([DataType::F32, DataType::F32])
                .build()
                .unwrap(),
        )
        .unwrap();
    let registry = builder.finalize();
    let cache = DispatchCache::new(Resolver::new(&registry));

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    let cpu = cache.get("Mul", Backend::Cpu, &binary_sig(DataType::I32)).unwrap();
                    assert_eq!(cpu.handle().symbol(), "mul_cpu");
                    let gpu = cache.get("Mul", Backend::Gpu, &binary_sig(DataType::F16)).unwrap();
                    assert_eq!(gpu.handle().symbol(), "mul_gpu");
                    assert_eq!(registry.lookup("Relu", Backend::Gpu).len(), 1);
                    assert!(registry.lookup("Relu", Backend::Cpu).is_empty());
                }
            });
        }
    });
    assert_eq!(cache.len(), 2);
}
