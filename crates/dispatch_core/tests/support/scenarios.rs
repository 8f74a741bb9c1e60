use dispatch_core::input::DispatchInput;
use dispatch_core::test_helpers::InputBuilder;

/// One hospital with one vehicle of each class and a single Normal request at
/// tick 1, distance 10, speed 5.
pub fn single_normal_trip() -> DispatchInput {
    InputBuilder::new(1).normal(1, 1, 1, 10).build()
}

/// Hospital 1 has no vehicles and two emergencies arriving at tick 1;
/// hospital 2 has one vehicle of each class and nothing queued.
pub fn emergency_overflow() -> DispatchInput {
    InputBuilder::new(2)
        .with_fleet(1, 0, 0)
        .with_distance(1, 2, 7)
        .emergency(1, 1, 1, 5, 3)
        .emergency(1, 2, 1, 5, 7)
        .build()
}

/// A mixed two-hospital day with cancellations at every trip stage.
pub fn mixed_day() -> DispatchInput {
    InputBuilder::new(2)
        .with_speeds(5, 10)
        .with_fleet(1, 2, 1)
        .with_fleet(2, 1, 2)
        .normal(1, 1, 1, 20)
        .serious(1, 2, 1, 15)
        .emergency(1, 3, 1, 10, 4)
        .emergency(2, 4, 1, 25, 9)
        .emergency(2, 5, 1, 5, 1)
        .normal(3, 6, 2, 30)
        .serious(3, 7, 2, 10)
        .emergency(4, 8, 2, 20, 6)
        .normal(5, 9, 1, 10)
        .serious(6, 10, 2, 40)
        .cancel(2, 9)
        .cancel(4, 7)
        .cancel(5, 6)
        .build()
}
