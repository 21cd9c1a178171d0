use std::collections::HashSet;

use tracing::info;

use super::FacilityService;
use crate::error::ServiceError;
use crate::models::{Department, Room, Tank};
use crate::store::ReconcilePlan;

impl FacilityService {
    /// Merges an input snapshot of the department/room/tank forest into
    /// persisted state: nodes without an id are created, nodes with one
    /// are matched and their name overwritten, and persisted nodes absent
    /// from the snapshot are deleted together with their descendants and
    /// readings. The whole call is one store transaction.
    pub async fn create_or_update_departments(
        &self,
        input: Vec<Department>,
    ) -> Result<Vec<Department>, ServiceError> {
        let existing = self.hierarchy.find_all_departments().await?;
        let plan = plan(input, &existing);
        info!(
            "Reconciling {} departments ({}/{}/{} deletions)",
            plan.departments.len(),
            plan.delete_departments.len(),
            plan.delete_rooms.len(),
            plan.delete_tanks.len()
        );
        Ok(self.hierarchy.commit_reconcile(plan).await?)
    }
}

/// Persisted ids per tree level, read once before processing.
#[derive(Debug, Default)]
struct ExistingIds {
    departments: HashSet<i32>,
    rooms: HashSet<i32>,
    tanks: HashSet<i32>,
}

impl ExistingIds {
    fn collect(forest: &[Department]) -> Self {
        let mut ids = ExistingIds::default();
        for department in forest {
            ids.departments.extend(department.id);
            for room in &department.rooms {
                ids.rooms.extend(room.id);
                for tank in &room.tanks {
                    ids.tanks.extend(tank.id);
                }
            }
        }
        ids
    }
}

/// Computes the write set of one reconciliation, without touching the store.
///
/// Bottom-up per department: tanks are resolved first, then their room, then
/// the department itself. A supplied id lands in that level's keep set even
/// when no persisted node carries it; the node is then saved as presented
/// with the id preserved. Deletions are the set difference between the
/// snapshot's ids and the keep sets, independently per level, so a subtree
/// omitted anywhere in the payload is deleted wholesale while nodes created
/// by this very call are never candidates.
pub(crate) fn plan(input: Vec<Department>, existing: &[Department]) -> ReconcilePlan {
    let existing_ids = ExistingIds::collect(existing);

    let mut keep_departments: HashSet<i32> = HashSet::new();
    let mut keep_rooms: HashSet<i32> = HashSet::new();
    let mut keep_tanks: HashSet<i32> = HashSet::new();

    let mut departments = Vec::with_capacity(input.len());
    for department in input {
        let mut rooms = Vec::with_capacity(department.rooms.len());
        for room in department.rooms {
            let mut tanks = Vec::with_capacity(room.tanks.len());
            for tank in room.tanks {
                keep_tanks.extend(tank.id);
                // matched tanks keep their identity, the input supplies the
                // name; ownership is recomputed from the enclosing room
                tanks.push(Tank {
                    id: tank.id,
                    name: tank.name,
                    room_id: room.id,
                });
            }

            keep_rooms.extend(room.id);
            rooms.push(Room {
                id: room.id,
                name: room.name,
                department_id: department.id,
                tanks,
            });
        }

        keep_departments.extend(department.id);
        departments.push(Department {
            id: department.id,
            name: department.name,
            rooms,
        });
    }

    ReconcilePlan {
        departments,
        delete_departments: difference(&existing_ids.departments, &keep_departments),
        delete_rooms: difference(&existing_ids.rooms, &keep_rooms),
        delete_tanks: difference(&existing_ids.tanks, &keep_tanks),
    }
}

fn difference(existing: &HashSet<i32>, kept: &HashSet<i32>) -> Vec<i32> {
    let mut ids: Vec<i32> = existing.difference(kept).copied().collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod test {
    use super::*;

    fn tank(id: Option<i32>, name: &str) -> Tank {
        Tank {
            id,
            name: name.to_owned(),
            room_id: None,
        }
    }

    fn room(id: Option<i32>, name: &str, tanks: Vec<Tank>) -> Room {
        Room {
            id,
            name: name.to_owned(),
            department_id: None,
            tanks,
        }
    }

    fn department(id: Option<i32>, name: &str, rooms: Vec<Room>) -> Department {
        Department {
            id,
            name: name.to_owned(),
            rooms,
        }
    }

    fn persisted_forest() -> Vec<Department> {
        vec![
            department(
                Some(1),
                "Breeding",
                vec![
                    room(
                        Some(2),
                        "North",
                        vec![tank(Some(3), "T-1"), tank(Some(4), "T-2")],
                    ),
                    room(Some(5), "South", vec![tank(Some(6), "T-3")]),
                ],
            ),
            department(
                Some(7),
                "Quarantine",
                vec![room(Some(8), "Iso", vec![tank(Some(9), "T-4")])],
            ),
        ]
    }

    #[test]
    fn plan_keeps_everything_on_identical_input() {
        let existing = persisted_forest();
        let plan = plan(existing.clone(), &existing);

        assert!(plan.delete_departments.is_empty());
        assert!(plan.delete_rooms.is_empty());
        assert!(plan.delete_tanks.is_empty());
        assert_eq!(2, plan.departments.len());
    }

    #[test]
    fn plan_deletes_omitted_subtrees_per_level() {
        let existing = persisted_forest();
        // resend only the first department, without its south room and
        // without tank 4
        let input = vec![department(
            Some(1),
            "Breeding",
            vec![room(Some(2), "North", vec![tank(Some(3), "T-1")])],
        )];

        let plan = plan(input, &existing);
        assert_eq!(vec![7], plan.delete_departments);
        assert_eq!(vec![5, 8], plan.delete_rooms);
        assert_eq!(vec![4, 6, 9], plan.delete_tanks);
    }

    #[test]
    fn plan_never_deletes_new_nodes() {
        let existing = persisted_forest();
        let input = vec![department(
            None,
            "Grow-out",
            vec![room(None, "East", vec![tank(None, "T-new")])],
        )];

        let plan = plan(input, &existing);
        // everything persisted goes away, the new subtree is saved
        assert_eq!(vec![1, 7], plan.delete_departments);
        assert_eq!(vec![2, 5, 8], plan.delete_rooms);
        assert_eq!(vec![3, 4, 6, 9], plan.delete_tanks);
        assert_eq!(None, plan.departments[0].id);
        assert_eq!(None, plan.departments[0].rooms[0].id);
        assert_eq!(None, plan.departments[0].rooms[0].tanks[0].id);
    }

    #[test]
    fn plan_recomputes_ownership_structurally() {
        let existing = persisted_forest();
        // move tank 6 from the south room into the north room
        let input = vec![
            department(
                Some(1),
                "Breeding",
                vec![
                    room(
                        Some(2),
                        "North",
                        vec![
                            tank(Some(3), "T-1"),
                            tank(Some(4), "T-2"),
                            tank(Some(6), "T-3"),
                        ],
                    ),
                    room(Some(5), "South", vec![]),
                ],
            ),
            department(
                Some(7),
                "Quarantine",
                vec![room(Some(8), "Iso", vec![tank(Some(9), "T-4")])],
            ),
        ];

        let plan = plan(input, &existing);
        assert!(plan.delete_tanks.is_empty());
        let north = &plan.departments[0].rooms[0];
        assert_eq!(Some(2), north.tanks[2].room_id);
    }

    #[test]
    fn plan_keeps_unresolved_supplied_ids() {
        let existing = persisted_forest();
        let mut input = existing.clone();
        input.push(department(Some(99), "Phantom", vec![]));

        let plan = plan(input, &existing);
        assert!(plan.delete_departments.is_empty());
        assert_eq!(Some(99), plan.departments[2].id);
    }

    #[test]
    fn plan_overwrites_names_in_place() {
        let existing = persisted_forest();
        let mut input = existing.clone();
        input[0].name = "Breeding II".to_owned();
        input[0].rooms[0].tanks[0].name = "T-1b".to_owned();

        let plan = plan(input, &existing);
        assert_eq!("Breeding II", plan.departments[0].name);
        assert_eq!("T-1b", plan.departments[0].rooms[0].tanks[0].name);
        assert_eq!(Some(1), plan.departments[0].id);
        assert_eq!(Some(3), plan.departments[0].rooms[0].tanks[0].id);
    }
}
