use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{NaiveDate, Utc};
use sitecart_core::{ExpectedVersion, TenantId};
use sitecart_fleet::{InMemoryStaffDirectory, InMemoryVehicleCatalog};
use sitecart_fulfillment::{
    CustomerRef, DeliverySchedule, EmployeeRef, FulfillmentCommand, FulfillmentOrderId,
    NewOrderItem, PackItem, PackingStatus, Queue,
};
use sitecart_infra::command_dispatcher::CommandDispatcher;
use sitecart_infra::dashboard::QueueFilter;
use sitecart_infra::event_store::InMemoryEventStore;
use sitecart_infra::notifications::StatusNotifier;
use sitecart_infra::service::FulfillmentService;
use std::sync::Arc;

type Service = FulfillmentService<Arc<InMemoryEventStore>>;

fn service_over(store: Arc<InMemoryEventStore>) -> Service {
    FulfillmentService::new(
        CommandDispatcher::new(store),
        Arc::new(InMemoryVehicleCatalog::with_defaults()),
        Arc::new(InMemoryStaffDirectory::with_defaults()),
        StatusNotifier::new(16),
    )
}

fn items(n: usize) -> Vec<NewOrderItem> {
    (0..n)
        .map(|i| NewOrderItem {
            product_id: format!("P-{i}"),
            name: format!("Item {i}"),
            quantity: 2,
            unit_price: 1_000,
            weight_label: Some("25kg".to_string()),
        })
        .collect()
}

fn place(service: &Service, tenant_id: TenantId, item_count: usize, total: u64) -> FulfillmentOrderId {
    service
        .place_order(
            tenant_id,
            CustomerRef {
                customer_id: "CUST-1".to_string(),
                name: None,
            },
            items(item_count),
            DeliverySchedule {
                delivery_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                time_slot: "08:00-12:00".to_string(),
                delivery_address: "Yard 4".to_string(),
            },
            total,
            Utc::now(),
        )
        .unwrap()
        .order
        .id_typed()
}

fn pack(service: &Service, tenant_id: TenantId, order_id: FulfillmentOrderId, idx: usize) {
    service
        .execute(
            FulfillmentCommand::PackItem(PackItem {
                tenant_id,
                order_id,
                item_index: idx,
                packing_status: PackingStatus::Packed,
                by: EmployeeRef::new("EMP-P01", "Packing Desk"),
                occurred_at: Utc::now(),
            }),
            ExpectedVersion::Any,
        )
        .unwrap();
}

fn bench_command_execution_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_execution_latency");
    group.sample_size(500);

    // First command on a fresh stream.
    group.bench_function("place_order_fresh", |b| {
        let service = service_over(Arc::new(InMemoryEventStore::new()));
        let tenant_id = TenantId::new();
        b.iter(|| black_box(place(&service, tenant_id, 3, 5_000)));
    });

    // Item toggle against an order whose stream keeps growing.
    group.bench_function("pack_item_with_history", |b| {
        let service = service_over(Arc::new(InMemoryEventStore::new()));
        let tenant_id = TenantId::new();
        let order_id = place(&service, tenant_id, 2, 5_000);
        let mut status = PackingStatus::Packed;

        b.iter(|| {
            status = match status {
                PackingStatus::Packed => PackingStatus::Unavailable,
                _ => PackingStatus::Packed,
            };
            service
                .execute(
                    FulfillmentCommand::PackItem(PackItem {
                        tenant_id,
                        order_id,
                        item_index: 0,
                        packing_status: black_box(status),
                        by: EmployeeRef::new("EMP-P01", "Packing Desk"),
                        occurred_at: Utc::now(),
                    }),
                    ExpectedVersion::Any,
                )
                .unwrap();
        });
    });

    group.finish();
}

fn bench_rehydration(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_rehydration");

    for item_count in [5usize, 50, 500].iter() {
        group.throughput(Throughput::Elements(*item_count as u64 + 2));
        group.bench_with_input(
            BenchmarkId::new("load_packed_order", item_count),
            item_count,
            |b, &n| {
                let service = service_over(Arc::new(InMemoryEventStore::new()));
                let tenant_id = TenantId::new();
                let order_id = place(&service, tenant_id, n, 5_000);
                for idx in 0..n {
                    pack(&service, tenant_id, order_id, idx);
                }

                b.iter(|| black_box(service.order(tenant_id, order_id).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_read_model_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_model_rebuild");

    for order_count in [10usize, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("rebuild_from_store", order_count),
            order_count,
            |b, &n| {
                let store = Arc::new(InMemoryEventStore::new());
                let writer = service_over(store.clone());
                let tenant_id = TenantId::new();
                for i in 0..n {
                    let order_id = place(&writer, tenant_id, 3, (i as u64 % 30) * 10);
                    pack(&writer, tenant_id, order_id, 0);
                }
                let reader = service_over(store);

                b.iter(|| black_box(reader.rebuild_read_models().unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_dashboard_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard_queue");

    for order_count in [10usize, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("packing_queue", order_count),
            order_count,
            |b, &n| {
                let service = service_over(Arc::new(InMemoryEventStore::new()));
                let tenant_id = TenantId::new();
                for i in 0..n {
                    place(&service, tenant_id, 3, (i as u64 % 30) * 10);
                }
                let filter = QueueFilter::default();

                b.iter(|| {
                    black_box(
                        service
                            .queue(tenant_id, Queue::Packing, &filter, Utc::now())
                            .unwrap(),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_command_execution_latency,
    bench_rehydration,
    bench_read_model_rebuild,
    bench_dashboard_queue
);
criterion_main!(benches);
