use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::Date;

/// One free room joined with its type, as returned by the availability query.
#[derive(Debug, Clone, FromRow)]
pub struct AvailableRoomRow {
    pub type_id: i32,
    pub type_name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub capacity: i32,
    pub room_id: i32,
    pub room_number: String,
}

/// All rooms with no active reservation overlapping [check_in, check_out),
/// optionally restricted to types sleeping at least `min_capacity`.
///
/// A reservation occupies the room iff `check_in_date < $2 AND
/// check_out_date > $1`; touching endpoints (checkout day equals the next
/// check-in day) do not conflict. Cancelled reservations never occupy.
/// Plain read, no locking: a stale answer is resolved at booking time.
pub async fn find_available(
    db: &PgPool,
    check_in: Date,
    check_out: Date,
    min_capacity: i32,
) -> Result<Vec<AvailableRoomRow>, sqlx::Error> {
    sqlx::query_as::<_, AvailableRoomRow>(
        r#"
        SELECT rt.type_id, rt.type_name, rt.description, rt.base_price, rt.capacity,
               ro.room_id, ro.room_number
        FROM rooms ro
        JOIN room_types rt ON rt.type_id = ro.type_id
        WHERE ($3 <= 0 OR rt.capacity >= $3)
          AND NOT EXISTS (
            SELECT 1
            FROM reservations r
            WHERE r.room_id = ro.room_id
              AND r.status <> 'Cancelled'
              AND r.check_in_date < $2
              AND r.check_out_date > $1
          )
        ORDER BY rt.base_price, rt.type_id, ro.room_number
        "#,
    )
    .bind(check_in)
    .bind(check_out)
    .bind(min_capacity)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod db_tests {
    use super::*;
    use crate::bookings::repo::{book, cancel_for_guest, BookingOutcome};
    use time::macros::date;

    async fn seed_catalog(pool: &PgPool) -> (i32, i32) {
        let (single,): (i32,) = sqlx::query_as(
            "INSERT INTO room_types (type_name, description, base_price, capacity) \
             VALUES ('Standard Single', 'economy pick', 1500.00, 1) RETURNING type_id",
        )
        .fetch_one(pool)
        .await
        .expect("seed type");
        let (double,): (i32,) = sqlx::query_as(
            "INSERT INTO room_types (type_name, description, base_price, capacity) \
             VALUES ('Deluxe Double', 'private balcony', 2800.00, 2) RETURNING type_id",
        )
        .fetch_one(pool)
        .await
        .expect("seed type");
        let (room_id,): (i32,) = sqlx::query_as(
            "INSERT INTO rooms (room_number, type_id) VALUES ('101', $1) RETURNING room_id",
        )
        .bind(single)
        .fetch_one(pool)
        .await
        .expect("seed room");
        sqlx::query("INSERT INTO rooms (room_number, type_id) VALUES ('201', $1)")
            .bind(double)
            .execute(pool)
            .await
            .expect("seed room");
        let (guest_id,): (i32,) = sqlx::query_as(
            "INSERT INTO guests (first_name, last_name, email, phone, password_hash) \
             VALUES ('Mei', 'Lin', 'mei@example.com', '0912345678', 'x') RETURNING guest_id",
        )
        .fetch_one(pool)
        .await
        .expect("seed guest");
        (room_id, guest_id)
    }

    #[sqlx::test]
    async fn free_rooms_are_listed_price_ordered(pool: PgPool) {
        let (room_id, _) = seed_catalog(&pool).await;
        let rows = find_available(&pool, date!(2030 - 06 - 01), date!(2030 - 06 - 03), 0)
            .await
            .expect("query");
        assert!(rows
            .iter()
            .any(|r| r.room_id == room_id && r.room_number == "101"));
        let prices: Vec<_> = rows.iter().map(|r| r.base_price).collect();
        let mut sorted = prices.clone();
        sorted.sort();
        assert_eq!(prices, sorted);
    }

    #[sqlx::test]
    async fn capacity_filter_hides_small_types(pool: PgPool) {
        seed_catalog(&pool).await;
        let rows = find_available(&pool, date!(2030 - 06 - 01), date!(2030 - 06 - 03), 2)
            .await
            .expect("query");
        assert!(rows.iter().all(|r| r.capacity >= 2));
        assert!(rows.iter().any(|r| r.room_number == "201"));
    }

    #[sqlx::test]
    async fn booked_room_is_hidden_until_checkout(pool: PgPool) {
        let (room_id, guest_id) = seed_catalog(&pool).await;
        let outcome = book(&pool, guest_id, room_id, date!(2030 - 06 - 01), date!(2030 - 06 - 03))
            .await
            .expect("book");
        assert!(matches!(outcome, BookingOutcome::Created(_)));

        let rows = find_available(&pool, date!(2030 - 06 - 01), date!(2030 - 06 - 03), 0)
            .await
            .expect("query");
        assert!(rows.iter().all(|r| r.room_id != room_id));

        // a window starting on the checkout day still lists the room
        let rows = find_available(&pool, date!(2030 - 06 - 03), date!(2030 - 06 - 05), 0)
            .await
            .expect("query");
        assert!(rows.iter().any(|r| r.room_id == room_id));
    }

    #[sqlx::test]
    async fn cancelled_reservation_frees_the_room(pool: PgPool) {
        let (room_id, guest_id) = seed_catalog(&pool).await;
        let BookingOutcome::Created(c) =
            book(&pool, guest_id, room_id, date!(2030 - 06 - 01), date!(2030 - 06 - 03))
                .await
                .expect("book")
        else {
            panic!("expected created booking");
        };

        let rows = find_available(&pool, date!(2030 - 06 - 01), date!(2030 - 06 - 03), 0)
            .await
            .expect("query");
        assert!(rows.iter().all(|r| r.room_id != room_id));

        cancel_for_guest(&pool, c.reservation.reservation_id, guest_id)
            .await
            .expect("cancel");

        let rows = find_available(&pool, date!(2030 - 06 - 01), date!(2030 - 06 - 03), 0)
            .await
            .expect("query");
        assert!(rows.iter().any(|r| r.room_id == room_id));
    }
}
