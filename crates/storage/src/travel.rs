use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{
    AccommodationBooking, FlightBooking, NewAccommodationBooking, NewFlightBooking, RecordId,
};

use crate::{to_rfc3339, StorageError};

const ACCOMMODATION_COLUMNS: &str =
    "id, employee_id, property_name, check_in, check_out, reference, notes";
const FLIGHT_COLUMNS: &str = "id, employee_id, departure_airport, arrival_airport, departure_time, \
     arrival_time, airline, confirmation_number";

/// Repository for the `accommodation_bookings` table.
pub struct AccommodationRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> AccommodationRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<AccommodationBooking>, StorageError> {
        let sql = format!("SELECT {ACCOMMODATION_COLUMNS} FROM accommodation_bookings ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_accommodation)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_employee(
        &mut self,
        employee_id: RecordId,
    ) -> Result<Vec<AccommodationBooking>, StorageError> {
        let sql = format!(
            "SELECT {ACCOMMODATION_COLUMNS} FROM accommodation_bookings WHERE employee_id = ? ORDER BY check_in, id"
        );
        let rows = sqlx::query(&sql)
            .bind(employee_id)
            .try_map(map_accommodation)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<AccommodationBooking>, StorageError> {
        let sql = format!("SELECT {ACCOMMODATION_COLUMNS} FROM accommodation_bookings WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_accommodation)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(
        &mut self,
        record: &NewAccommodationBooking,
    ) -> Result<AccommodationBooking, StorageError> {
        let sql = format!(
            "INSERT INTO accommodation_bookings (employee_id, property_name, check_in, check_out, reference, notes) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {ACCOMMODATION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(record.employee_id)
            .bind(&record.property_name)
            .bind(record.check_in)
            .bind(record.check_out)
            .bind(&record.reference)
            .bind(&record.notes)
            .try_map(map_accommodation)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, booking: &AccommodationBooking) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE accommodation_bookings \
             SET property_name = ?, check_in = ?, check_out = ?, reference = ?, notes = ? \
             WHERE id = ?",
        )
        .bind(&booking.property_name)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(&booking.reference)
        .bind(&booking.notes)
        .bind(booking.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM accommodation_bookings WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Repository for the `flight_bookings` table.
pub struct FlightRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> FlightRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<FlightBooking>, StorageError> {
        let sql = format!("SELECT {FLIGHT_COLUMNS} FROM flight_bookings ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_flight)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_employee(
        &mut self,
        employee_id: RecordId,
    ) -> Result<Vec<FlightBooking>, StorageError> {
        let sql = format!(
            "SELECT {FLIGHT_COLUMNS} FROM flight_bookings WHERE employee_id = ? ORDER BY departure_time, id"
        );
        let rows = sqlx::query(&sql)
            .bind(employee_id)
            .try_map(map_flight)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<FlightBooking>, StorageError> {
        let sql = format!("SELECT {FLIGHT_COLUMNS} FROM flight_bookings WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_flight)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(&mut self, record: &NewFlightBooking) -> Result<FlightBooking, StorageError> {
        let sql = format!(
            "INSERT INTO flight_bookings \
             (employee_id, departure_airport, arrival_airport, departure_time, arrival_time, airline, confirmation_number) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {FLIGHT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(record.employee_id)
            .bind(&record.departure_airport)
            .bind(&record.arrival_airport)
            .bind(to_rfc3339(record.departure_time))
            .bind(to_rfc3339(record.arrival_time))
            .bind(&record.airline)
            .bind(&record.confirmation_number)
            .try_map(map_flight)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, flight: &FlightBooking) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE flight_bookings \
             SET departure_airport = ?, arrival_airport = ?, departure_time = ?, arrival_time = ?, \
                 airline = ?, confirmation_number = ? \
             WHERE id = ?",
        )
        .bind(&flight.departure_airport)
        .bind(&flight.arrival_airport)
        .bind(to_rfc3339(flight.departure_time))
        .bind(to_rfc3339(flight.arrival_time))
        .bind(&flight.airline)
        .bind(&flight.confirmation_number)
        .bind(flight.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM flight_bookings WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_accommodation(row: SqliteRow) -> Result<AccommodationBooking, sqlx::Error> {
    Ok(AccommodationBooking {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        property_name: row.try_get("property_name")?,
        check_in: row.try_get("check_in")?,
        check_out: row.try_get("check_out")?,
        reference: row.try_get("reference")?,
        notes: row.try_get("notes")?,
    })
}

fn map_flight(row: SqliteRow) -> Result<FlightBooking, sqlx::Error> {
    Ok(FlightBooking {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        departure_airport: row.try_get("departure_airport")?,
        arrival_airport: row.try_get("arrival_airport")?,
        departure_time: row.try_get("departure_time")?,
        arrival_time: row.try_get("arrival_time")?,
        airline: row.try_get("airline")?,
        confirmation_number: row.try_get("confirmation_number")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use workright_core::types::{NewAccommodationBooking, NewFlightBooking};

    #[tokio::test]
    async fn bookings_are_removed_with_the_employee() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");
        let alice = uow
            .employees()
            .insert(&new_employee("Alice", None), today())
            .await
            .expect("employee");

        let stay = uow
            .accommodations()
            .insert(&NewAccommodationBooking {
                employee_id: alice.id,
                property_name: "Downtown Hotel".to_string(),
                check_in: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                check_out: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
                reference: None,
                notes: None,
            })
            .await
            .expect("stay");

        let departure = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        let flight = uow
            .flights()
            .insert(&NewFlightBooking {
                employee_id: alice.id,
                departure_airport: "JFK".to_string(),
                arrival_airport: "LAX".to_string(),
                departure_time: departure,
                arrival_time: departure + Duration::hours(6),
                airline: Some("Example Air".to_string()),
                confirmation_number: None,
            })
            .await
            .expect("flight");
        assert_eq!(flight.arrival_time, departure + Duration::hours(6));

        assert!(uow.employees().delete(alice.id).await.expect("delete"));
        assert!(uow.accommodations().fetch(stay.id).await.expect("fetch").is_none());
        assert!(uow.flights().fetch(flight.id).await.expect("fetch").is_none());
    }
}
