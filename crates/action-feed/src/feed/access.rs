use super::domain::PositionId;

/// Whether `current` may see actions meant for `allowed`.
///
/// The super-position passes for every list, including an empty one.
pub fn is_position_allowed(current: PositionId, allowed: &[PositionId]) -> bool {
    current == PositionId::SUPER_ADMIN || allowed.contains(&current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_position_is_always_allowed() {
        assert!(is_position_allowed(PositionId::SUPER_ADMIN, &[]));
        assert!(is_position_allowed(
            PositionId::SUPER_ADMIN,
            &[PositionId::BRANCH_MANAGER]
        ));
    }

    #[test]
    fn other_positions_need_membership() {
        let joint = [
            PositionId::GENERAL_OPERATIONS_ADMINISTRATOR,
            PositionId::PROVINCIAL_OPERATIONS_ADMINISTRATOR,
        ];
        assert!(is_position_allowed(
            PositionId::PROVINCIAL_OPERATIONS_ADMINISTRATOR,
            &joint
        ));
        assert!(!is_position_allowed(PositionId::BRANCH_MANAGER, &joint));
        assert!(!is_position_allowed(PositionId::BRANCH_MANAGER, &[]));
    }
}
