use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Money, OrderItem, OrderStatus, PlaceOrder};

fn cart(lines: usize) -> Vec<OrderItem> {
    (0..lines)
        .map(|i| {
            OrderItem::new(
                format!("food-{}", i % 8),
                format!("Dish {}", i % 8),
                (i % 3 + 1) as u32,
                Money::from_minor(250 + (i % 8) as i64 * 100),
            )
        })
        .collect()
}

fn bench_place_order(c: &mut Criterion) {
    let items = cart(4);

    c.bench_function("domain/place_order_small_cart", |b| {
        b.iter(|| {
            PlaceOrder::new("user-bench", items.clone(), "1 Bench Road")
                .into_order(Money::from_minor(2000))
                .unwrap()
        });
    });
}

fn bench_place_order_with_duplicates(c: &mut Criterion) {
    let items = cart(64);

    c.bench_function("domain/place_order_collapsing_64_lines", |b| {
        b.iter(|| {
            PlaceOrder::new("user-bench", items.clone(), "1 Bench Road")
                .into_order(Money::from_minor(2000))
                .unwrap()
        });
    });
}

fn bench_status_walk(c: &mut Criterion) {
    let order = PlaceOrder::new("user-bench", cart(4), "1 Bench Road")
        .into_order(Money::from_minor(2000))
        .unwrap();

    c.bench_function("domain/status_walk", |b| {
        b.iter(|| {
            let mut order = order.clone();
            let now = chrono::Utc::now();
            if let Some(changes) = order.mark_paid() {
                order.apply(&changes, now);
            }
            for next in [
                OrderStatus::Preparing,
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered,
            ] {
                if let Ok(Some(changes)) = order.change_status(next) {
                    order.apply(&changes, now);
                }
            }
            order
        });
    });
}

criterion_group!(
    benches,
    bench_place_order,
    bench_place_order_with_duplicates,
    bench_status_walk
);
criterion_main!(benches);
