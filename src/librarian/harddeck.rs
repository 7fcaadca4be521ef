//! Hard Deck: safe Simulator Scripting Engine definitions
//!
//! A fixed in-memory table of the sanitized-environment SSE API surface.
//! The model is instructed never to rely on training data for these
//! classes; it fetches the table instead. Lookup is by exact category
//! name, with `All` returning the entire table.

use serde_json::{json, Value};
use std::sync::OnceLock;

/// Category names in the order quoted by the unknown-category error
pub const CATEGORIES: [&str; 5] = ["Group", "Unit", "timer", "trigger", "coalition"];

fn definitions() -> &'static Value {
    static TABLE: OnceLock<Value> = OnceLock::new();
    TABLE.get_or_init(|| {
        json!({
            "Group": {
                "description": "Represents a group of units. Static class, access via Group.getByName.",
                "functions": {
                    "Group.getByName(name)": "Returns the Group with the given mission-editor name, or nil.",
                    "Group.getUnits()": "Returns a table (1-based array) of Unit objects in the group.",
                    "Group.getUnit(unitIndex)": "Returns the Unit at the given 1-based index, or nil.",
                    "Group.getSize()": "Returns the current number of living units in the group.",
                    "Group.getInitialSize()": "Returns the unit count at mission start.",
                    "Group.getName()": "Returns the group name string.",
                    "Group.getID()": "Returns the unique mission id of the group.",
                    "Group.getCoalition()": "Returns a coalition.side enumerator value.",
                    "Group.getCategory()": "Returns a Group.Category enumerator (AIRPLANE, HELICOPTER, GROUND, SHIP, TRAIN).",
                    "Group.activate()": "Activates an uncontrolled or late-activated group.",
                    "Group.destroy()": "Removes the group from the mission without events.",
                    "Group.isExist()": "Returns true while the group exists.",
                    "Group.getController()": "Returns the Controller for AI tasking."
                }
            },
            "Unit": {
                "description": "Represents a single unit (aircraft, vehicle, ship). Access via Unit.getByName.",
                "functions": {
                    "Unit.getByName(name)": "Returns the Unit with the given mission-editor name, or nil.",
                    "Unit.getName()": "Returns the unit name string.",
                    "Unit.getPlayerName()": "Returns the controlling player's name, or nil for AI.",
                    "Unit.getGroup()": "Returns the Group the unit belongs to.",
                    "Unit.getLife()": "Returns current life points; unit is dead below 1.",
                    "Unit.getLife0()": "Returns initial life points.",
                    "Unit.getPoint()": "Returns a Vec3 position {x, y, z} in map coordinates.",
                    "Unit.getPosition()": "Returns a Position3 orientation table {p, x, y, z}.",
                    "Unit.getVelocity()": "Returns a Vec3 velocity vector in m/s.",
                    "Unit.inAir()": "Returns true when airborne.",
                    "Unit.getTypeName()": "Returns the unit type string (e.g. 'FA-18C_hornet').",
                    "Unit.getCoalition()": "Returns a coalition.side enumerator value.",
                    "Unit.isActive()": "Returns true when the unit is activated.",
                    "Unit.destroy()": "Removes the unit from the mission without events."
                }
            },
            "timer": {
                "description": "Mission time and scheduled function singleton. The only sanctioned way to run periodic logic.",
                "functions": {
                    "timer.getTime()": "Returns mission time in seconds (fractional) since mission start.",
                    "timer.getAbsTime()": "Returns model time of day in seconds since 00:00:00.",
                    "timer.getTime0()": "Returns the mission start time of day in seconds.",
                    "timer.scheduleFunction(functionToCall, functionArgument, time)": "Schedules functionToCall(arg, time) at the given mission time; returning a number reschedules at that time. Use instead of loops.",
                    "timer.removeFunction(functionId)": "Cancels a scheduled function by the id scheduleFunction returned.",
                    "timer.setFunctionTime(functionId, time)": "Re-targets a scheduled function to a new fire time."
                }
            },
            "trigger": {
                "description": "Mission trigger actions and flag state singleton.",
                "functions": {
                    "trigger.action.outText(text, displayTime, clearview)": "Displays text to all players.",
                    "trigger.action.outTextForCoalition(coalition, text, displayTime)": "Displays text to one coalition.",
                    "trigger.action.outTextForGroup(groupId, text, displayTime)": "Displays text to one group.",
                    "trigger.action.outSound(soundfile)": "Plays a sound file from the .miz to all players.",
                    "trigger.action.setUserFlag(flag, value)": "Sets a mission flag to a number or boolean.",
                    "trigger.misc.getUserFlag(flag)": "Returns the numeric value of a mission flag.",
                    "trigger.action.smoke(point, color)": "Spawns a smoke marker at a Vec3 (trigger.smokeColor enum).",
                    "trigger.action.illuminationBomb(point, power)": "Spawns an illumination flare at a Vec3.",
                    "trigger.action.explosion(point, power)": "Creates an explosion at a Vec3.",
                    "trigger.action.markToAll(id, text, point, readOnly)": "Adds an F10 map marker visible to all."
                }
            },
            "coalition": {
                "description": "Coalition queries and dynamic spawning singleton.",
                "functions": {
                    "coalition.side": "Enumerator table: NEUTRAL = 0, RED = 1, BLUE = 2.",
                    "coalition.getGroups(coalitionId, groupCategory)": "Returns a table of Groups for a coalition, optionally filtered by category.",
                    "coalition.getPlayers(coalitionId)": "Returns a table of player-controlled Units in a coalition.",
                    "coalition.getAirbases(coalitionId)": "Returns a table of Airbase objects owned by a coalition.",
                    "coalition.addGroup(countryId, groupCategory, groupData)": "Dynamically spawns a group from a group-data table.",
                    "coalition.getCountryCoalition(countryId)": "Returns the coalition a country belongs to.",
                    "coalition.getServiceProviders(coalitionId, service)": "Returns units providing a service (ATC, AWACS, TANKER, FAC)."
                }
            }
        })
    })
}

/// Look up a Hard Deck category and return its definitions as text.
///
/// `All` returns the complete table. The result is always a string; an
/// unknown category yields an enumerated error the model can read.
pub fn lookup(category: &str) -> String {
    let table = definitions();

    if category == "All" {
        return serde_json::to_string_pretty(table)
            .unwrap_or_else(|_| "ERROR: Hard Deck serialization failed.".to_string());
    }

    match table.get(category) {
        Some(entry) => serde_json::to_string_pretty(entry)
            .unwrap_or_else(|_| "ERROR: Hard Deck serialization failed.".to_string()),
        None => format!(
            "ERROR: Category not found in Hard Deck. Available: {}.",
            CATEGORIES.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_category() {
        let result = lookup("timer");
        assert!(result.contains("timer.scheduleFunction"));
        assert!(!result.starts_with("ERROR:"));
    }

    #[test]
    fn test_all_returns_every_category() {
        let result = lookup("All");
        for category in CATEGORIES {
            assert!(result.contains(category), "missing {}", category);
        }
    }

    #[test]
    fn test_category_is_case_sensitive() {
        // The capability schema constrains casing; lookup mirrors it
        assert!(lookup("group").starts_with("ERROR:"));
        assert!(!lookup("Group").starts_with("ERROR:"));
    }

    #[test]
    fn test_unknown_category_enumerates_valid_ones() {
        let result = lookup("Weather");
        assert_eq!(
            result,
            "ERROR: Category not found in Hard Deck. Available: Group, Unit, timer, trigger, coalition."
        );
    }
}
