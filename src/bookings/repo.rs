use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

/// Mirrors the `reservation_status` Postgres enum. Transitions are
/// Confirmed -> Cancelled only; rows are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

/// Reservation record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub reservation_id: i32,
    pub guest_id: i32,
    pub room_id: i32,
    pub check_in_date: Date,
    pub check_out_date: Date,
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub created_at: OffsetDateTime,
}

/// Reservation joined with room number and type name, for history listings.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub reservation_id: i32,
    pub room_number: String,
    pub type_name: String,
    pub check_in_date: Date,
    pub check_out_date: Date,
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
struct LockedRoom {
    room_id: i32,
    room_number: String,
    base_price: Decimal,
}

pub struct CreatedBooking {
    pub reservation: Reservation,
    pub room_number: String,
}

/// Result of the check-then-insert transaction.
pub enum BookingOutcome {
    Created(Box<CreatedBooking>),
    RoomMissing,
    Overlap,
}

/// Billable nights for a stay: whole days in [check_in, check_out),
/// clamped to at least one night.
pub fn nights_between(check_in: Date, check_out: Date) -> i64 {
    (check_out - check_in).whole_days().max(1)
}

/// Total price for a stay at the given nightly rate. DECIMAL(10,2) in,
/// DECIMAL(10,2) out; no rounding beyond the currency's minor unit.
pub fn quote_total(base_price: Decimal, nights: i64) -> Decimal {
    base_price * Decimal::from(nights)
}

/// Atomic check-then-insert for a new reservation.
///
/// The transaction locks the room row (`FOR UPDATE`), which serializes
/// concurrent booking attempts for the same room across all processes
/// sharing the store. The overlap predicate is then re-evaluated against
/// the live table, and the insert only happens if the window is still
/// free. The `reservations_no_overlap` exclusion constraint backs this up
/// at the schema level. Early returns drop the transaction, which rolls
/// back; no partial write survives a failed attempt.
pub async fn book(
    db: &PgPool,
    guest_id: i32,
    room_id: i32,
    check_in: Date,
    check_out: Date,
) -> Result<BookingOutcome, sqlx::Error> {
    let mut tx = db.begin().await?;

    let room = sqlx::query_as::<_, LockedRoom>(
        r#"
        SELECT ro.room_id, ro.room_number, rt.base_price
        FROM rooms ro
        JOIN room_types rt ON rt.type_id = ro.type_id
        WHERE ro.room_id = $1
        FOR UPDATE OF ro
        "#,
    )
    .bind(room_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(room) = room else {
        return Ok(BookingOutcome::RoomMissing);
    };

    let (occupied,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM reservations
            WHERE room_id = $1
              AND status <> 'Cancelled'
              AND check_in_date < $3
              AND check_out_date > $2
        )
        "#,
    )
    .bind(room_id)
    .bind(check_in)
    .bind(check_out)
    .fetch_one(&mut *tx)
    .await?;

    if occupied {
        return Ok(BookingOutcome::Overlap);
    }

    let nights = nights_between(check_in, check_out);
    let total = quote_total(room.base_price, nights);

    let reservation = sqlx::query_as::<_, Reservation>(
        r#"
        INSERT INTO reservations (guest_id, room_id, check_in_date, check_out_date, total_price)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING reservation_id, guest_id, room_id, check_in_date, check_out_date,
                  total_price, status, created_at
        "#,
    )
    .bind(guest_id)
    .bind(room.room_id)
    .bind(check_in)
    .bind(check_out)
    .bind(total)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(BookingOutcome::Created(Box::new(CreatedBooking {
        reservation,
        room_number: room.room_number,
    })))
}

/// The guest's own reservations, newest first.
pub async fn list_for_guest(
    db: &PgPool,
    guest_id: i32,
    limit: i64,
    offset: i64,
) -> Result<Vec<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT r.reservation_id, ro.room_number, rt.type_name,
               r.check_in_date, r.check_out_date, r.total_price, r.status, r.created_at
        FROM reservations r
        JOIN rooms ro ON ro.room_id = r.room_id
        JOIN room_types rt ON rt.type_id = ro.type_id
        WHERE r.guest_id = $1
        ORDER BY r.created_at DESC, r.reservation_id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(guest_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

/// Soft-cancel, scoped to the owning guest in the same statement so a
/// foreign reservation is indistinguishable from a missing one. Setting an
/// already-Cancelled row to Cancelled is a no-op with the same end state,
/// which makes the call idempotent.
pub async fn cancel_for_guest(
    db: &PgPool,
    reservation_id: i32,
    guest_id: i32,
) -> Result<Option<ReservationStatus>, sqlx::Error> {
    let updated: Option<(ReservationStatus,)> = sqlx::query_as(
        r#"
        UPDATE reservations
        SET status = 'Cancelled'
        WHERE reservation_id = $1 AND guest_id = $2
        RETURNING status
        "#,
    )
    .bind(reservation_id)
    .bind(guest_id)
    .fetch_optional(db)
    .await?;
    Ok(updated.map(|(status,)| status))
}


#[cfg(test)]
mod db_tests {
    use super::*;
    use crate::bookings::services::is_overlap_violation;
    use time::macros::date;

    async fn seed_guest(pool: &PgPool, email: &str) -> i32 {
        let (guest_id,): (i32,) = sqlx::query_as(
            "INSERT INTO guests (first_name, last_name, email, phone, password_hash) \
             VALUES ('Mei', 'Lin', $1, '0912345678', 'x') RETURNING guest_id",
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("seed guest");
        guest_id
    }

    async fn seed_standard_room(pool: &PgPool) -> (i32, i32) {
        let (type_id,): (i32,) = sqlx::query_as(
            "INSERT INTO room_types (type_name, description, base_price, capacity) \
             VALUES ('Standard Single', 'economy pick', 1500.00, 1) RETURNING type_id",
        )
        .fetch_one(pool)
        .await
        .expect("seed room type");
        let (room_id,): (i32,) = sqlx::query_as(
            "INSERT INTO rooms (room_number, type_id) VALUES ('101', $1) RETURNING room_id",
        )
        .bind(type_id)
        .fetch_one(pool)
        .await
        .expect("seed room");
        let guest_id = seed_guest(pool, "mei@example.com").await;
        (room_id, guest_id)
    }

    fn created(outcome: BookingOutcome) -> CreatedBooking {
        match outcome {
            BookingOutcome::Created(c) => *c,
            BookingOutcome::RoomMissing => panic!("room unexpectedly missing"),
            BookingOutcome::Overlap => panic!("window unexpectedly taken"),
        }
    }

    #[sqlx::test]
    async fn booking_derives_total_from_store_price(pool: PgPool) {
        let (room_id, guest_id) = seed_standard_room(&pool).await;
        let c = created(
            book(&pool, guest_id, room_id, date!(2030 - 06 - 01), date!(2030 - 06 - 03))
                .await
                .expect("book"),
        );
        assert_eq!(c.reservation.total_price, Decimal::new(300_000, 2));
        assert_eq!(c.reservation.status, ReservationStatus::Confirmed);
        assert_eq!(c.room_number, "101");
    }

    #[sqlx::test]
    async fn overlapping_booking_is_refused(pool: PgPool) {
        let (room_id, guest_id) = seed_standard_room(&pool).await;
        created(
            book(&pool, guest_id, room_id, date!(2030 - 06 - 01), date!(2030 - 06 - 03))
                .await
                .expect("book"),
        );
        let second = book(&pool, guest_id, room_id, date!(2030 - 06 - 02), date!(2030 - 06 - 04))
            .await
            .expect("book");
        assert!(matches!(second, BookingOutcome::Overlap));
    }

    #[sqlx::test]
    async fn touching_windows_do_not_conflict(pool: PgPool) {
        let (room_id, guest_id) = seed_standard_room(&pool).await;
        created(
            book(&pool, guest_id, room_id, date!(2030 - 06 - 01), date!(2030 - 06 - 03))
                .await
                .expect("book"),
        );
        // checkout day doubles as the next guest's check-in day
        let next = book(&pool, guest_id, room_id, date!(2030 - 06 - 03), date!(2030 - 06 - 05))
            .await
            .expect("book");
        assert!(matches!(next, BookingOutcome::Created(_)));
    }

    #[sqlx::test]
    async fn unknown_room_reports_missing(pool: PgPool) {
        let (_, guest_id) = seed_standard_room(&pool).await;
        let outcome = book(&pool, guest_id, 9999, date!(2030 - 06 - 01), date!(2030 - 06 - 03))
            .await
            .expect("book");
        assert!(matches!(outcome, BookingOutcome::RoomMissing));
    }

    #[sqlx::test]
    async fn concurrent_bookings_exactly_one_wins(pool: PgPool) {
        let (room_id, guest_id) = seed_standard_room(&pool).await;
        let (a, b) = tokio::join!(
            book(&pool, guest_id, room_id, date!(2030 - 06 - 01), date!(2030 - 06 - 03)),
            book(&pool, guest_id, room_id, date!(2030 - 06 - 02), date!(2030 - 06 - 04)),
        );
        let outcomes = [a.expect("book"), b.expect("book")];
        let wins = outcomes
            .iter()
            .filter(|o| matches!(o, BookingOutcome::Created(_)))
            .count();
        let refusals = outcomes
            .iter()
            .filter(|o| matches!(o, BookingOutcome::Overlap))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(refusals, 1);
    }

    #[sqlx::test]
    async fn exclusion_constraint_backstops_direct_inserts(pool: PgPool) {
        let (room_id, guest_id) = seed_standard_room(&pool).await;
        created(
            book(&pool, guest_id, room_id, date!(2030 - 06 - 01), date!(2030 - 06 - 03))
                .await
                .expect("book"),
        );
        let err = sqlx::query(
            "INSERT INTO reservations (guest_id, room_id, check_in_date, check_out_date, total_price) \
             VALUES ($1, $2, $3, $4, 1500.00)",
        )
        .bind(guest_id)
        .bind(room_id)
        .bind(date!(2030 - 06 - 02))
        .bind(date!(2030 - 06 - 04))
        .execute(&pool)
        .await
        .expect_err("overlapping insert must violate the constraint");
        assert!(is_overlap_violation(&err));
    }

    #[sqlx::test]
    async fn cancel_is_idempotent_and_owner_scoped(pool: PgPool) {
        let (room_id, guest_id) = seed_standard_room(&pool).await;
        let c = created(
            book(&pool, guest_id, room_id, date!(2030 - 06 - 01), date!(2030 - 06 - 03))
                .await
                .expect("book"),
        );
        let rid = c.reservation.reservation_id;
        let other = seed_guest(&pool, "kai@example.com").await;

        // another guest's cancel is a miss and leaves the row untouched
        assert!(cancel_for_guest(&pool, rid, other)
            .await
            .expect("cancel")
            .is_none());
        let rows = list_for_guest(&pool, guest_id, 20, 0).await.expect("list");
        assert_eq!(rows[0].status, ReservationStatus::Confirmed);

        assert_eq!(
            cancel_for_guest(&pool, rid, guest_id).await.expect("cancel"),
            Some(ReservationStatus::Cancelled)
        );
        assert_eq!(
            cancel_for_guest(&pool, rid, guest_id).await.expect("cancel"),
            Some(ReservationStatus::Cancelled)
        );
    }
}
